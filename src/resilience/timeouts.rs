//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound every backend attempt with a hard deadline
//! - Cancel the in-flight call cleanly on expiry
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - A timeout is a distinct, transient error so retries and the breaker see it

use async_trait::async_trait;
use std::time::Duration;

use crate::adapters::AccountFetcher;
use crate::domain::{AccountSummary, AdapterError};
use crate::observability::metrics;

/// Decorator applying a per-attempt deadline.
pub struct AttemptTimeout<F> {
    inner: F,
    backend: String,
    limit: Duration,
}

impl<F> AttemptTimeout<F> {
    pub fn new(inner: F, backend: impl Into<String>, limit: Duration) -> Self {
        Self {
            inner,
            backend: backend.into(),
            limit,
        }
    }
}

#[async_trait]
impl<F: AccountFetcher> AccountFetcher for AttemptTimeout<F> {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        match tokio::time::timeout(self.limit, self.inner.fetch(account_id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    backend = %self.backend,
                    account_id = %account_id,
                    timeout_ms = self.limit.as_millis() as u64,
                    "Backend attempt timed out"
                );
                metrics::record_timeout(&self.backend);
                Err(AdapterError::Timeout(self.limit))
            }
        }
    }
}
