//! Product data from the upstream nomenclature/price-list API.
//!
//! # Architecture
//!
//! - [`source`] talks to the upstream API and normalizes its two product shapes
//! - [`pricing`] applies a nomenclature's price list to its products
//! - [`cache`] keeps the last good response per resource, fresh or stale
//! - [`mock`] is the built-in dataset served when nothing else is available
//! - [`service`] ties them together and never fails: the response carries a
//!   `source` marker (`api`, `cache`, `stale_cache`, `mock`) instead
//!
//! # Example
//!
//! ```rust,ignore
//! let service = CatalogService::new(Arc::new(UpstreamClient::new(&config.catalog)?), &config.catalog);
//! let response = service.products_by_nomenclature("smartphones").await;
//! tracing::info!(source = ?response.source, count = response.count, "catalog loaded");
//! ```

pub mod cache;
pub mod mock;
pub mod pricing;
pub mod service;
pub mod source;
pub mod types;

pub use cache::TtlCache;
pub use pricing::merge_prices;
pub use service::{CatalogKey, CatalogResponse, CatalogService, CatalogSourceKind};
pub use source::{CatalogSource, UpstreamClient};
pub use types::{CatalogProduct, PriceEntry, UpstreamProduct};

use thiserror::Error;

/// Errors from the upstream catalog API.
///
/// These never reach HTTP clients; [`CatalogService`] logs them and falls back.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No upstream base URL is configured.
    #[error("upstream catalog API is not configured")]
    NotConfigured,

    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body didn't match either known format.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
