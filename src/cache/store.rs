//! Cache store contract and entry model.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{AccountSummary, AccountType, CacheError};

/// Cache key for an account: `{accountType}:{accountId}`.
pub fn cache_key(kind: AccountType, account_id: &str) -> String {
    format!("{}:{}", kind.as_str(), account_id)
}

/// What a cache entry remembers about an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedValue {
    Account(Box<AccountSummary>),
    /// Negative entry: the backend confirmed the account does not exist.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub value: CachedValue,
    pub inserted_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, value: CachedValue, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value,
            inserted_at: Utc::now(),
            ttl,
        }
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.inserted_at)
            .to_std()
            .unwrap_or_default()
    }

    /// `now - insertedAt > ttl`.
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        self.age_at(now) > self.ttl
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }
}

/// Key-value store with explicit delete. Implementations may fail at any call.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Insert or overwrite.
    async fn put(&self, entry: CacheEntry) -> Result<(), CacheError>;

    /// Returns whether an entry was removed. Missing keys are not an error.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Drop every entry, returning how many were removed.
    async fn clear(&self) -> Result<usize, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}
