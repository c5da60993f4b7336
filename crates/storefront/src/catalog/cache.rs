//! Keyed cache that keeps entries past their TTL.
//!
//! A plain TTL cache forgets an entry when it expires, which is exactly when
//! the fallback path needs it. Entries here are never expired by the store;
//! callers ask for a [`fresh`](TtlCache::fresh) entry first and fall back to
//! a [`stale`](TtlCache::stale) one when refreshing fails.

use std::hash::Hash;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use moka::future::Cache;

/// Upper bound on the number of keys, as a memory guard only.
const MAX_KEYS: u64 = 1000;

/// A cached value with the time it was fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub fetched_at: DateTime<Utc>,
    stored_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// One slot per key holding the last value and when it was stored.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    entries: Cache<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().max_capacity(MAX_KEYS).build(),
            ttl,
        }
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The entry for `key` if it was stored less than one TTL ago.
    pub async fn fresh(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries
            .get(key)
            .await
            .filter(|entry| entry.is_fresh(self.ttl))
    }

    /// The entry for `key` regardless of age.
    pub async fn stale(&self, key: &K) -> Option<CacheEntry<V>> {
        self.entries.get(key).await
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub async fn insert(&self, key: K, value: V) -> CacheEntry<V> {
        let entry = CacheEntry {
            value,
            fetched_at: Utc::now(),
            stored_at: Instant::now(),
        };
        self.entries.insert(key, entry.clone()).await;
        entry
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_within_ttl() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        assert!(cache.fresh(&"a").await.is_none());

        cache.insert("a", 1).await;
        assert_eq!(cache.fresh(&"a").await.map(|e| e.value), Some(1));
        assert_eq!(cache.ttl(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_expired_entry_is_only_stale() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::ZERO);
        cache.insert("a", 7).await;

        assert!(cache.fresh(&"a").await.is_none());
        assert_eq!(cache.stale(&"a").await.map(|e| e.value), Some(7));
    }

    #[tokio::test]
    async fn test_insert_overwrites_and_invalidate_removes() {
        let cache: TtlCache<String, &str> = TtlCache::new(Duration::from_secs(60));
        cache.insert("k".to_string(), "old").await;
        cache.insert("k".to_string(), "new").await;
        assert_eq!(cache.fresh(&"k".to_string()).await.map(|e| e.value), Some("new"));

        cache.invalidate(&"k".to_string()).await;
        assert!(cache.stale(&"k".to_string()).await.is_none());
    }
}
