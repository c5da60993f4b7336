//! OAuth 2.0 authorization-code sign-in.
//!
//! 1. [`OAuthClient::authorization_url`] builds the provider redirect with a
//!    random `state` that the login route keeps in the session
//! 2. The provider redirects back with `code` and `state`
//! 3. [`OAuthClient::exchange_code`] trades the code for an access token
//! 4. [`OAuthClient::fetch_profile`] reads the user's email and subject

use rand::Rng;
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::OAuthConfig;

const SCOPES: &str = "openid email profile";

/// Length of the CSRF `state` parameter.
pub const STATE_LENGTH: usize = 32;

/// Errors that can occur during the OAuth flow.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Userinfo request failed or returned no usable email.
    #[error("profile request failed: {0}")]
    Profile(String),

    /// Provider says the email address is not verified.
    #[error("email address is not verified")]
    UnverifiedEmail,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

/// The identity the provider vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProfile {
    /// Provider's stable user ID.
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}

/// Client for one OAuth provider.
#[derive(Clone)]
pub struct OAuthClient {
    client: reqwest::Client,
    config: OAuthConfig,
}

impl OAuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn provider(&self) -> &str {
        &self.config.provider
    }

    /// Where to send the browser to start sign-in.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Url {
        let mut url = self.config.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", SCOPES)
            .append_pair("state", state);
        url
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::TokenExchange` if the provider rejects the code.
    #[instrument(skip_all, fields(provider = %self.config.provider))]
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .client
            .post(self.config.token_url.clone())
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(text.chars().take(200).collect()));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Read the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::Profile` if the request fails or carries no email.
    /// Returns `OAuthError::UnverifiedEmail` if the provider flags the email.
    #[instrument(skip_all, fields(provider = %self.config.provider))]
    pub async fn fetch_profile(&self, access_token: &str) -> Result<OAuthProfile, OAuthError> {
        let response = self
            .client
            .get(self.config.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OAuthError::Profile(format!("HTTP {}", response.status())));
        }

        let info: UserInfoResponse = response.json().await?;
        profile_from_userinfo(info)
    }
}

fn profile_from_userinfo(info: UserInfoResponse) -> Result<OAuthProfile, OAuthError> {
    if info.email_verified == Some(false) {
        return Err(OAuthError::UnverifiedEmail);
    }

    let email = info
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| OAuthError::Profile("no email in profile".to_string()))?;

    Ok(OAuthProfile {
        subject: info.sub,
        email,
        name: info.name,
    })
}

/// Random alphanumeric string for the `state` parameter.
#[must_use]
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..STATE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET.get(idx).map_or('0', |b| char::from(*b))
        })
        .collect()
}
