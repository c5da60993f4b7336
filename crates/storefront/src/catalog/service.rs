//! Cached, fault-tolerant access to upstream catalog data.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use ampere_core::Currency;

use super::CatalogError;
use super::cache::{CacheEntry, TtlCache};
use super::mock::{mock_products, mock_products_for};
use super::pricing::merge_prices;
use super::source::CatalogSource;
use super::types::CatalogProduct;
use crate::config::CatalogConfig;

/// Cache key: one slot per upstream resource.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CatalogKey {
    All,
    Nomenclature(String),
}

/// Where a catalog response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSourceKind {
    /// Fetched from upstream for this request.
    Api,
    /// Served from cache within the TTL.
    Cache,
    /// Upstream failed; served an expired cache entry.
    StaleCache,
    /// Upstream failed with nothing cached; served the built-in dataset.
    Mock,
}

/// Products plus where they came from.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogResponse {
    pub products: Vec<CatalogProduct>,
    pub source: CatalogSourceKind,
    /// When the data was fetched from upstream; `None` for mock data.
    pub fetched_at: Option<DateTime<Utc>>,
    pub count: usize,
}

impl CatalogResponse {
    fn new(
        products: Vec<CatalogProduct>,
        source: CatalogSourceKind,
        fetched_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            count: products.len(),
            products,
            source,
            fetched_at,
        }
    }

    fn from_entry(entry: CacheEntry<Vec<CatalogProduct>>, source: CatalogSourceKind) -> Self {
        Self::new(entry.value, source, Some(entry.fetched_at))
    }
}

/// Upstream catalog with caching and fallback.
///
/// Lookups never fail. Order of preference: fresh cache, upstream, stale
/// cache, mock data, empty. Concurrent refreshes of one key may both hit
/// upstream; the last write wins.
#[derive(Clone)]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    cache: TtlCache<CatalogKey, Vec<CatalogProduct>>,
    default_currency: Currency,
}

impl CatalogService {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>, config: &CatalogConfig) -> Self {
        Self::with_ttl(source, config.cache_ttl, config.default_currency)
    }

    #[must_use]
    pub fn with_ttl(
        source: Arc<dyn CatalogSource>,
        ttl: Duration,
        default_currency: Currency,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new(ttl),
            default_currency,
        }
    }

    /// All upstream products.
    #[instrument(skip(self))]
    pub async fn products(&self) -> CatalogResponse {
        let currency = self.default_currency;
        self.resolve(
            CatalogKey::All,
            || self.source.fetch_products(),
            || mock_products(currency),
        )
        .await
    }

    /// Products of one nomenclature with its price list applied.
    ///
    /// Products and prices are fetched concurrently; if either request fails
    /// the whole refresh counts as failed.
    #[instrument(skip(self))]
    pub async fn products_by_nomenclature(&self, nomenclature_id: &str) -> CatalogResponse {
        let currency = self.default_currency;
        let fetch = || async {
            let (products, prices) = tokio::try_join!(
                self.source.fetch_nomenclature_products(nomenclature_id),
                self.source.fetch_price_list(nomenclature_id),
            )?;
            Ok::<_, CatalogError>(merge_prices(products, prices, currency))
        };

        self.resolve(
            CatalogKey::Nomenclature(nomenclature_id.to_owned()),
            fetch,
            || mock_products_for(nomenclature_id, currency),
        )
        .await
    }

    /// Drop every cached entry, fresh or stale.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Drop one cached entry.
    pub async fn invalidate(&self, key: &CatalogKey) {
        self.cache.invalidate(key).await;
    }

    async fn resolve<F, Fut, M>(&self, key: CatalogKey, fetch: F, mock: M) -> CatalogResponse
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<CatalogProduct>, CatalogError>>,
        M: FnOnce() -> Vec<CatalogProduct>,
    {
        if let Some(entry) = self.cache.fresh(&key).await {
            debug!(?key, "Catalog cache hit");
            return CatalogResponse::from_entry(entry, CatalogSourceKind::Cache);
        }

        let error = match fetch().await {
            Ok(products) => {
                let entry = self.cache.insert(key, products).await;
                return CatalogResponse::from_entry(entry, CatalogSourceKind::Api);
            }
            Err(error) => error,
        };

        if matches!(error, CatalogError::NotConfigured) {
            debug!(?key, "No upstream catalog configured");
        } else {
            warn!(?key, error = %error, "Upstream catalog fetch failed, falling back");
        }

        if let Some(entry) = self.cache.stale(&key).await {
            return CatalogResponse::from_entry(entry, CatalogSourceKind::StaleCache);
        }

        CatalogResponse::new(mock(), CatalogSourceKind::Mock, None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::PriceEntry;

    /// Serves a scripted sequence of outcomes, then keeps failing.
    struct ScriptedSource {
        products: Mutex<Vec<Result<Vec<CatalogProduct>, CatalogError>>>,
        prices: Vec<PriceEntry>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<CatalogProduct>, CatalogError>>) -> Self {
            Self {
                products: Mutex::new(script.into_iter().rev().collect()),
                prices: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn next(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.products
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(unavailable()))
        }
    }

    #[async_trait]
    impl CatalogSource for ScriptedSource {
        async fn fetch_products(&self) -> Result<Vec<CatalogProduct>, CatalogError> {
            self.next()
        }

        async fn fetch_nomenclature_products(
            &self,
            _nomenclature_id: &str,
        ) -> Result<Vec<CatalogProduct>, CatalogError> {
            self.next()
        }

        async fn fetch_price_list(
            &self,
            _nomenclature_id: &str,
        ) -> Result<Vec<PriceEntry>, CatalogError> {
            Ok(self.prices.clone())
        }
    }

    fn unavailable() -> CatalogError {
        CatalogError::Status {
            status: 503,
            message: "maintenance".to_string(),
        }
    }

    fn product(id: &str) -> CatalogProduct {
        CatalogProduct {
            id: id.to_string(),
            code: format!("UP-{id}"),
            name: format!("Upstream {id}"),
            description: None,
            price: Some(Decimal::from(100)),
            original_price: None,
            discount_percent: None,
            currency: Currency::Rub,
            images: vec![],
            nomenclature_id: Some("smartphones".to_string()),
            specifications: std::collections::BTreeMap::new(),
            price_type: None,
        }
    }

    fn service(source: ScriptedSource, ttl: Duration) -> (CatalogService, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let service = CatalogService::with_ttl(source.clone(), ttl, Currency::Rub);
        (service, source)
    }

    #[tokio::test]
    async fn test_api_then_cache() {
        let (service, source) = service(
            ScriptedSource::new(vec![Ok(vec![product("1")])]),
            Duration::from_secs(300),
        );

        let first = service.products().await;
        assert_eq!(first.source, CatalogSourceKind::Api);
        assert_eq!(first.count, 1);

        let second = service.products().await;
        assert_eq!(second.source, CatalogSourceKind::Cache);
        assert_eq!(second.fetched_at, first.fetched_at);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_serves_stale_cache() {
        let (service, _) = service(
            ScriptedSource::new(vec![Ok(vec![product("1"), product("2")]), Err(unavailable())]),
            Duration::ZERO,
        );

        assert_eq!(service.products().await.source, CatalogSourceKind::Api);

        let fallback = service.products().await;
        assert_eq!(fallback.source, CatalogSourceKind::StaleCache);
        assert_eq!(fallback.count, 2);
        assert_eq!(fallback.products[0].id, "1");
    }

    #[tokio::test]
    async fn test_failure_without_cache_serves_mock() {
        let (service, _) = service(
            ScriptedSource::new(vec![Err(unavailable())]),
            Duration::from_secs(300),
        );

        let response = service.products().await;
        assert_eq!(response.source, CatalogSourceKind::Mock);
        assert!(response.count > 0);
        assert!(response.fetched_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_nomenclature_without_cache_is_empty() {
        let (service, _) = service(ScriptedSource::new(vec![]), Duration::from_secs(300));

        let response = service.products_by_nomenclature("drones").await;
        assert_eq!(response.source, CatalogSourceKind::Mock);
        assert_eq!(response.count, 0);
    }

    #[tokio::test]
    async fn test_nomenclature_prices_are_merged() {
        let mut source = ScriptedSource::new(vec![Ok(vec![product("1")])]);
        source.prices = vec![PriceEntry {
            product_id: "1".to_string(),
            price_type: "Online".to_string(),
            price: Decimal::from(80),
            old_price: Some(Decimal::from(100)),
            currency: None,
        }];
        let (service, _) = service(source, Duration::from_secs(300));

        let response = service.products_by_nomenclature("smartphones").await;
        assert_eq!(response.source, CatalogSourceKind::Api);
        assert_eq!(response.products[0].price, Some(Decimal::from(80)));
        assert_eq!(response.products[0].discount_percent, Some(20));
    }

    #[tokio::test]
    async fn test_keys_are_independent_and_invalidation_clears() {
        let (service, source) = service(
            ScriptedSource::new(vec![Ok(vec![product("1")]), Ok(vec![product("2")])]),
            Duration::from_secs(300),
        );

        assert_eq!(service.products().await.source, CatalogSourceKind::Api);
        let phones = service.products_by_nomenclature("smartphones").await;
        assert_eq!(phones.source, CatalogSourceKind::Api);
        assert_eq!(phones.products[0].id, "2");

        service.invalidate(&CatalogKey::All).await;
        assert_eq!(service.products().await.source, CatalogSourceKind::Mock);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }
}
