//! In-process cache store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::time::Duration;

use crate::cache::store::{CacheEntry, CacheStore};
use crate::domain::CacheError;

/// DashMap-backed store. Entries older than `ttl + max_stale` are dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
    max_stale: Duration,
}

impl MemoryStore {
    pub fn new(max_stale: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_stale,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: chrono::DateTime<Utc>) -> bool {
        entry.age_at(now) > entry.ttl.saturating_add(self.max_stale)
    }

    /// Remove `key` only if the entry stored right now is still expired, so a
    /// concurrent `put` between the check and the removal survives.
    fn evict_expired(&self, key: &str, now: chrono::DateTime<Utc>) -> bool {
        self.entries
            .remove_if(key, |_, entry| self.is_expired(entry, now))
            .is_some()
    }

    /// Remove entries past their retention window.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now = Utc::now();
        let entry = match self.entries.get(key) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };
        if self.is_expired(&entry, now) {
            self.evict_expired(key, now);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn clear(&self) -> Result<usize, CacheError> {
        let removed = self.entries.len();
        self.entries.clear();
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::CachedValue;

    fn aged(key: &str, ttl: Duration, age_secs: i64) -> CacheEntry {
        let mut entry = CacheEntry::new(key, CachedValue::Missing, ttl);
        entry.inserted_at = Utc::now() - chrono::Duration::seconds(age_secs);
        entry
    }

    #[tokio::test]
    async fn keeps_stale_entries_within_retention() {
        let store = MemoryStore::new(Duration::from_secs(100));
        store.put(aged("bank:BNK-1", Duration::from_secs(10), 50)).await.unwrap();

        let entry = store.get("bank:BNK-1").await.unwrap().unwrap();
        assert!(entry.is_stale());
    }

    #[tokio::test]
    async fn drops_entries_past_retention() {
        let store = MemoryStore::new(Duration::from_secs(5));
        store.put(aged("bank:BNK-1", Duration::from_secs(10), 60)).await.unwrap();
        store.put(aged("bank:BNK-2", Duration::from_secs(10), 60)).await.unwrap();
        store.put(aged("bank:BNK-3", Duration::from_secs(10), 0)).await.unwrap();

        assert!(store.get("bank:BNK-1").await.unwrap().is_none());
        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn eviction_spares_an_entry_rewritten_after_the_expiry_check() {
        let store = MemoryStore::new(Duration::from_secs(5));
        store.put(aged("bank:BNK-1", Duration::from_secs(10), 60)).await.unwrap();
        let now = Utc::now();

        // A fresh write lands between the reader's expiry check and its eviction.
        store.put(aged("bank:BNK-1", Duration::from_secs(10), 0)).await.unwrap();
        assert!(!store.evict_expired("bank:BNK-1", now));

        let entry = store.get("bank:BNK-1").await.unwrap().unwrap();
        assert!(!entry.is_stale());

        store.put(aged("bank:BNK-2", Duration::from_secs(10), 60)).await.unwrap();
        assert!(store.evict_expired("bank:BNK-2", now));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::new(Duration::ZERO);
        assert!(!store.delete("bank:nope").await.unwrap());
        store.put(aged("bank:BNK-1", Duration::from_secs(10), 0)).await.unwrap();
        assert!(store.delete("bank:BNK-1").await.unwrap());
        assert!(!store.delete("bank:BNK-1").await.unwrap());
        assert_eq!(store.clear().await.unwrap(), 0);
    }
}
