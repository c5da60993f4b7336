//! Sign-in with an external OAuth provider.
//!
//! The login route keeps a random `state` in the session; the callback only
//! proceeds when the provider echoes the same value back.

use axum::{
    Router,
    extract::{Query, State},
    response::Redirect,
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::set_current_user;
use crate::models::{CurrentUser, session_keys};
use crate::services::auth::AuthService;
use crate::services::oauth::{OAuthClient, generate_state};
use crate::state::AppState;

const CALLBACK_PATH: &str = "/api/auth/oauth/callback";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/oauth/login", get(login))
        .route(CALLBACK_PATH, get(callback))
}

/// Query parameters the provider sends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn client(state: &AppState) -> Result<&OAuthClient> {
    state
        .oauth()
        .ok_or_else(|| AppError::NotFound("OAuth sign-in".to_string()))
}

fn redirect_uri(state: &AppState) -> String {
    format!("{}{CALLBACK_PATH}", state.config().base_url)
}

/// Redirect the browser to the provider.
#[instrument(skip_all)]
async fn login(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let client = client(&state)?;
    let csrf_state = generate_state();
    session
        .insert(session_keys::OAUTH_STATE, &csrf_state)
        .await?;

    let url = client.authorization_url(&redirect_uri(&state), &csrf_state);
    Ok(Redirect::to(url.as_str()))
}

/// Finish sign-in and send the browser back to the storefront.
#[instrument(skip_all)]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect> {
    let client = client(&state)?;

    let expected: Option<String> = session.remove(session_keys::OAUTH_STATE).await?;
    match (expected, query.state.as_deref()) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => {
            tracing::warn!(provider = client.provider(), "OAuth state mismatch");
            return Err(AppError::BadRequest("Invalid OAuth state".to_string()));
        }
    }

    if let Some(error) = query.error {
        tracing::info!(provider = client.provider(), error = %error, "OAuth sign-in declined");
        return Err(AppError::BadRequest("Sign-in was cancelled".to_string()));
    }

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    let token = client.exchange_code(&code, &redirect_uri(&state)).await?;
    let profile = client.fetch_profile(&token).await?;
    let user = AuthService::new(state.pool()).sign_in_oauth(&profile).await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    tracing::info!(user_id = %user.id, provider = client.provider(), "User signed in with OAuth");

    Ok(Redirect::to(&state.config().base_url))
}
