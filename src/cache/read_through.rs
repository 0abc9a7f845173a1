//! Read-through cache policy.
//!
//! # Lookup
//! 1. Miss → fetch through the pipeline, write on success, return fresh
//! 2. Fresh hit → return without a backend call
//! 3. Stale hit → refresh; on failure serve the stale value with `stale=true`
//! 4. Failure with nothing cached → propagate
//!
//! A store that errors is bypassed: the lookup goes straight to the backend
//! and the request never fails because of the cache.

use std::sync::Arc;
use std::time::Duration;

use crate::adapters::AccountFetcher;
use crate::cache::store::{cache_key, CacheEntry, CacheStore, CachedValue};
use crate::config::CacheConfig;
use crate::domain::{AccountSummary, AccountType, AdapterError, CacheError};
use crate::observability::metrics;

/// How a single lookup may use the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Read a cached entry if present, otherwise fetch and write.
    #[default]
    Use,
    /// Skip the read, fetch, and overwrite the entry.
    Refresh,
    /// Neither read nor write.
    Bypass,
}

pub struct ReadThroughCache {
    store: Arc<dyn CacheStore>,
    enabled: bool,
    ttl: Duration,
    negative_ttl: Option<Duration>,
}

impl ReadThroughCache {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            enabled: config.enabled,
            ttl: config.ttl(),
            negative_ttl: config.negative_ttl(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub async fn lookup(
        &self,
        kind: AccountType,
        account_id: &str,
        fetcher: &dyn AccountFetcher,
        mode: CacheMode,
    ) -> Result<AccountSummary, AdapterError> {
        if !self.enabled || mode == CacheMode::Bypass {
            return fetcher.fetch(account_id).await;
        }

        let key = cache_key(kind, account_id);
        let mut store_ok = true;
        let mut fallback = None;

        if mode == CacheMode::Use {
            match self.store.get(&key).await {
                Ok(Some(entry)) if !entry.is_stale() => {
                    metrics::record_cache_hit();
                    metrics::set_cache_connected(true);
                    return match entry.value {
                        CachedValue::Account(summary) => Ok(Self::with_stale(*summary, false)),
                        CachedValue::Missing => Err(AdapterError::NotFound(account_id.to_string())),
                    };
                }
                Ok(Some(entry)) => {
                    metrics::set_cache_connected(true);
                    tracing::debug!(key = %key, "Cache entry stale, refreshing");
                    fallback = Some(entry);
                }
                Ok(None) => {
                    metrics::set_cache_connected(true);
                    metrics::record_cache_miss();
                }
                Err(e) => {
                    self.store_failed("get", &e);
                    store_ok = false;
                }
            }
        }

        match fetcher.fetch(account_id).await {
            Ok(summary) => {
                let summary = Self::with_stale(summary, false);
                if store_ok {
                    let entry = CacheEntry::new(
                        key,
                        CachedValue::Account(Box::new(summary.clone())),
                        self.ttl,
                    );
                    self.write(entry).await;
                }
                Ok(summary)
            }
            Err(e) if e.is_not_found() => {
                if store_ok {
                    match self.negative_ttl {
                        Some(ttl) => self.write(CacheEntry::new(key, CachedValue::Missing, ttl)).await,
                        None => {
                            if fallback.is_some() || mode == CacheMode::Refresh {
                                self.remove(&key).await;
                            }
                        }
                    }
                }
                Err(e)
            }
            Err(e) => match fallback.map(|entry| entry.value) {
                Some(CachedValue::Account(summary)) => {
                    metrics::record_cache_stale();
                    tracing::warn!(
                        account_id = %account_id,
                        error = %e,
                        "Refresh failed, serving stale entry"
                    );
                    Ok(Self::with_stale(*summary, true))
                }
                _ => Err(e),
            },
        }
    }

    /// Remove every cached entry for an account id. Unknown ids are a no-op.
    pub async fn invalidate(&self, account_id: &str) -> Result<usize, CacheError> {
        let mut removed = 0;
        for kind in AccountType::ALL {
            if self.store.delete(&cache_key(kind, account_id)).await? {
                removed += 1;
            }
        }
        tracing::info!(account_id = %account_id, removed = removed, "Cache invalidated");
        Ok(removed)
    }

    pub async fn invalidate_all(&self) -> Result<usize, CacheError> {
        let removed = self.store.clear().await?;
        tracing::info!(removed = removed, "Cache flushed");
        Ok(removed)
    }

    /// Whether the store answers; also refreshes the connectivity gauge.
    pub async fn connected(&self) -> bool {
        let ok = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Cache store ping failed");
                false
            }
        };
        metrics::set_cache_connected(ok);
        ok
    }

    async fn write(&self, entry: CacheEntry) {
        if let Err(e) = self.store.put(entry).await {
            self.store_failed("put", &e);
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            self.store_failed("delete", &e);
        }
    }

    fn store_failed(&self, op: &'static str, err: &CacheError) {
        tracing::warn!(op = op, error = %err, "Cache store failed, bypassing");
        metrics::record_cache_error(op);
        metrics::set_cache_connected(false);
    }

    fn with_stale(mut summary: AccountSummary, stale: bool) -> AccountSummary {
        summary.stale = stale;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::testing::{summary, ScriptedFetcher};
    use crate::cache::MemoryStore;
    use async_trait::async_trait;

    struct DownStore;

    #[async_trait]
    impl CacheStore for DownStore {
        async fn get(&self, _: &str) -> Result<Option<CacheEntry>, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn put(&self, _: CacheEntry) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _: &str) -> Result<bool, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn clear(&self) -> Result<usize, CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    fn config(negative_ttl_secs: u64) -> CacheConfig {
        CacheConfig {
            enabled: true,
            ttl_secs: 60,
            max_stale_secs: 3600,
            negative_ttl_secs,
        }
    }

    fn cache_over(store: Arc<dyn CacheStore>, negative_ttl_secs: u64) -> ReadThroughCache {
        ReadThroughCache::new(store, &config(negative_ttl_secs))
    }

    async fn age_entry(store: &MemoryStore, key: &str, secs: i64) {
        let mut entry = store.get(key).await.unwrap().unwrap();
        entry.inserted_at = entry.inserted_at - chrono::Duration::seconds(secs);
        store.put(entry).await.unwrap();
    }

    #[tokio::test]
    async fn fresh_hit_skips_backend() {
        let cache = cache_over(Arc::new(MemoryStore::new(Duration::from_secs(60))), 0);
        let backend = ScriptedFetcher::ok();

        let first = cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        let second = cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        assert_eq!(first, second);
        assert!(!second.stale);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn stale_entry_served_when_refresh_fails() {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(3600)));
        let cache = cache_over(store.clone(), 0);

        let healthy = ScriptedFetcher::ok();
        cache.lookup(AccountType::Bank, "BNK-1", &healthy, CacheMode::Use).await.unwrap();
        age_entry(&store, "bank:BNK-1", 120).await;

        let down = ScriptedFetcher::always(AdapterError::Unavailable("503".into()));
        let served = cache.lookup(AccountType::Bank, "BNK-1", &down, CacheMode::Use).await.unwrap();
        assert!(served.stale);
        assert_eq!(served.account_id, "BNK-1");
        assert_eq!(down.calls(), 1);
    }

    #[tokio::test]
    async fn stale_entry_refreshed_when_backend_recovers() {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(3600)));
        let cache = cache_over(store.clone(), 0);
        let backend = ScriptedFetcher::ok();

        cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        age_entry(&store, "bank:BNK-1", 120).await;

        let refreshed = cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        assert!(!refreshed.stale);
        assert_eq!(backend.calls(), 2);
        assert!(!store.get("bank:BNK-1").await.unwrap().unwrap().is_stale());
    }

    #[tokio::test]
    async fn miss_with_failing_backend_propagates() {
        let cache = cache_over(Arc::new(MemoryStore::new(Duration::from_secs(60))), 0);
        let down = ScriptedFetcher::always(AdapterError::Unavailable("503".into()));
        assert!(cache.lookup(AccountType::Bank, "BNK-1", &down, CacheMode::Use).await.is_err());
    }

    #[tokio::test]
    async fn invalidation_is_idempotent_and_forces_fresh_fetch() {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(3600)));
        let cache = cache_over(store.clone(), 0);
        let backend = ScriptedFetcher::ok();

        assert_eq!(cache.invalidate("BNK-404").await.unwrap(), 0);

        cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        age_entry(&store, "bank:BNK-1", 120).await;
        assert_eq!(cache.invalidate("BNK-1").await.unwrap(), 1);
        assert_eq!(cache.invalidate("BNK-1").await.unwrap(), 0);

        let refetched = cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        assert!(!refetched.stale);
        assert_eq!(backend.calls(), 2);
        assert!(!store.get("bank:BNK-1").await.unwrap().unwrap().is_stale());
    }

    #[tokio::test]
    async fn unreachable_store_is_bypassed() {
        let cache = cache_over(Arc::new(DownStore), 0);
        let backend = ScriptedFetcher::ok();

        let result = cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await;
        assert!(result.is_ok());
        assert!(!cache.connected().await);
        assert!(cache.invalidate_all().await.is_err());
    }

    #[tokio::test]
    async fn negative_entries_only_when_enabled() {
        let missing = ScriptedFetcher::always(AdapterError::NotFound("BNK-9".into()));

        let plain = cache_over(Arc::new(MemoryStore::new(Duration::from_secs(60))), 0);
        for _ in 0..2 {
            let _ = plain.lookup(AccountType::Bank, "BNK-9", &missing, CacheMode::Use).await;
        }
        assert_eq!(missing.calls(), 2);

        let missing = ScriptedFetcher::always(AdapterError::NotFound("BNK-9".into()));
        let negative = cache_over(Arc::new(MemoryStore::new(Duration::from_secs(60))), 30);
        for _ in 0..2 {
            let err = negative
                .lookup(AccountType::Bank, "BNK-9", &missing, CacheMode::Use)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
        assert_eq!(missing.calls(), 1);
    }

    #[tokio::test]
    async fn refresh_mode_skips_read_but_writes() {
        let store = Arc::new(MemoryStore::new(Duration::from_secs(60)));
        let cache = cache_over(store.clone(), 0);
        let backend = ScriptedFetcher::with_fallback(Ok(summary("BNK-1")));

        cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Refresh).await.unwrap();
        assert_eq!(backend.calls(), 2);

        cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn disabled_cache_always_fetches() {
        let mut cfg = config(0);
        cfg.enabled = false;
        let cache = ReadThroughCache::new(Arc::new(MemoryStore::new(Duration::ZERO)), &cfg);
        let backend = ScriptedFetcher::ok();

        for _ in 0..3 {
            cache.lookup(AccountType::Bank, "BNK-1", &backend, CacheMode::Use).await.unwrap();
        }
        assert_eq!(backend.calls(), 3);
    }
}
