//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::{CatalogError, CatalogService, CatalogSource, UpstreamClient};
use crate::config::StorefrontConfig;
use crate::services::oauth::OAuthClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The catalog cache lives here, so every
/// request sees the same cached upstream data.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: CatalogService,
    oauth: Option<OAuthClient>,
}

impl AppState {
    /// Create the application state with the HTTP upstream catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, CatalogError> {
        let source = Arc::new(UpstreamClient::new(&config.catalog)?);
        Ok(Self::with_catalog_source(config, pool, source))
    }

    /// Create the application state with a custom catalog source.
    #[must_use]
    pub fn with_catalog_source(
        config: StorefrontConfig,
        pool: PgPool,
        source: Arc<dyn CatalogSource>,
    ) -> Self {
        let catalog = CatalogService::new(source, &config.catalog);
        let oauth = config.oauth.clone().map(OAuthClient::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog,
                oauth,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cached upstream catalog.
    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    /// OAuth client, if sign-in with a provider is configured.
    #[must_use]
    pub fn oauth(&self) -> Option<&OAuthClient> {
        self.inner.oauth.as_ref()
    }
}
