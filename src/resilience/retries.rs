//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is retryable (transient errors only)
//! - Execute retries with exponential backoff + jitter
//! - Bound the total number of attempts per lookup
//!
//! # Design Decisions
//! - `NotFound` and mapping failures are terminal and never retried
//! - An open circuit stops the sequence immediately
//! - Jittered backoff prevents thundering herd

use async_trait::async_trait;

use crate::adapters::AccountFetcher;
use crate::config::RetryConfig;
use crate::domain::{AccountSummary, AdapterError};
use crate::observability::metrics;
use crate::resilience::backoff::backoff_for;

/// Decorator that retries transient failures of the wrapped fetcher.
pub struct RetryExecutor<F> {
    inner: F,
    backend: String,
    policy: RetryConfig,
}

impl<F> RetryExecutor<F> {
    pub fn new(inner: F, backend: impl Into<String>, policy: RetryConfig) -> Self {
        Self {
            inner,
            backend: backend.into(),
            policy,
        }
    }

    /// Initial attempt plus configured retries.
    pub fn max_attempts(&self) -> u32 {
        self.policy.max_retries.saturating_add(1)
    }
}

#[async_trait]
impl<F: AccountFetcher> AccountFetcher for RetryExecutor<F> {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        let max_attempts = self.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match self.inner.fetch(account_id).await {
                Ok(summary) => return Ok(summary),
                Err(e) => e,
            };

            if !err.is_transient() {
                return Err(err);
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    backend = %self.backend,
                    account_id = %account_id,
                    attempts = attempt,
                    error = %err,
                    "Retries exhausted"
                );
                return Err(AdapterError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = backoff_for(&self.policy, attempt);
            tracing::debug!(
                backend = %self.backend,
                account_id = %account_id,
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying backend call"
            );
            metrics::record_retry(&self.backend);
            tokio::time::sleep(delay).await;
        }
    }
}
