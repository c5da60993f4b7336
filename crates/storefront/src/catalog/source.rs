//! Where catalog data comes from.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use ampere_core::Currency;

use super::CatalogError;
use super::types::{CatalogProduct, Envelope, PriceEntry, UpstreamProduct};
use crate::config::CatalogConfig;

/// A provider of upstream product data.
///
/// Implementations return normalized products; the wire formats stay behind
/// this trait.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All products.
    async fn fetch_products(&self) -> Result<Vec<CatalogProduct>, CatalogError>;

    /// Products of one nomenclature.
    async fn fetch_nomenclature_products(
        &self,
        nomenclature_id: &str,
    ) -> Result<Vec<CatalogProduct>, CatalogError>;

    /// Price list of one nomenclature.
    async fn fetch_price_list(&self, nomenclature_id: &str)
    -> Result<Vec<PriceEntry>, CatalogError>;
}

/// HTTP client for the upstream catalog API.
///
/// One attempt per call, bounded by the configured timeout.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: Option<Url>,
    default_currency: Currency,
}

impl UpstreamClient {
    /// Create a client from configuration.
    ///
    /// A missing `api_url` is allowed; every fetch then fails with
    /// `CatalogError::NotConfigured`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client can't be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ampere-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            default_currency: config.default_currency,
        })
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone().ok_or(CatalogError::NotConfigured)?;
        url.path_segments_mut()
            .map_err(|()| CatalogError::NotConfigured)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Upstream catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse upstream catalog response"
            );
            CatalogError::Parse(e)
        })
    }

    async fn get_products(&self, url: Url) -> Result<Vec<CatalogProduct>, CatalogError> {
        let envelope: Envelope<UpstreamProduct> = self.get_json(url).await?;
        Ok(envelope
            .into_vec()
            .into_iter()
            .map(|p| p.normalize(self.default_currency))
            .collect())
    }
}

#[async_trait]
impl CatalogSource for UpstreamClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
        let products = self.get_products(self.endpoint(&["products"])?).await?;
        debug!(count = products.len(), "Fetched upstream products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn fetch_nomenclature_products(
        &self,
        nomenclature_id: &str,
    ) -> Result<Vec<CatalogProduct>, CatalogError> {
        let url = self.endpoint(&["nomenclatures", nomenclature_id, "products"])?;
        let products = self.get_products(url).await?;
        debug!(count = products.len(), "Fetched nomenclature products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn fetch_price_list(
        &self,
        nomenclature_id: &str,
    ) -> Result<Vec<PriceEntry>, CatalogError> {
        let url = self.endpoint(&["nomenclatures", nomenclature_id, "prices"])?;
        let entries: Envelope<PriceEntry> = self.get_json(url).await?;
        let entries = entries.into_vec();
        debug!(count = entries.len(), "Fetched price list");
        Ok(entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client(api_url: Option<&str>) -> UpstreamClient {
        UpstreamClient::new(&CatalogConfig {
            api_url: api_url.map(|u| Url::parse(u).unwrap()),
            cache_ttl: Duration::from_secs(300),
            timeout: Duration::from_secs(1),
            default_currency: Currency::Rub,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let client = client(Some("https://api.example.com/v2/"));
        let url = client
            .endpoint(&["nomenclatures", "tv audio", "prices"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/v2/nomenclatures/tv%20audio/prices"
        );

        let url = client.endpoint(&["nomenclatures", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v2/nomenclatures/a%2Fb");
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let client = client(None);
        assert!(matches!(
            client.fetch_products().await,
            Err(CatalogError::NotConfigured)
        ));
        assert!(matches!(
            client.fetch_price_list("1").await,
            Err(CatalogError::NotConfigured)
        ));
    }
}
