//! Backend adapter subsystem.
//!
//! # Data Flow
//! ```text
//! account id
//!     → registry.rs (longest id-prefix match → BackendHandle)
//!     → pipeline (composed AccountFetcher decorators):
//!         RetryExecutor        resilience/retries.rs
//!           → BreakerGuard     resilience/circuit_breaker.rs
//!             → AttemptTimeout resilience/timeouts.rs
//!               → FaultInjector resilience/fault.rs
//!                 → HttpAdapter http.rs (one HTTP call → mapping)
//! ```
//!
//! # Design Decisions
//! - Every layer implements the same `fetch(id) -> Result` contract, so each
//!   concern is testable in isolation
//! - Adapters never retry; the breaker sees every individual attempt
//! - HTTP 404 → NotFound, 5xx / network → Unavailable, bad body → Mapping

pub mod http;
pub mod registry;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{AccountSummary, AdapterError};

pub use http::HttpAdapter;
pub use registry::{AdapterRegistry, BackendHandle};

/// Uniform account lookup contract shared by adapters and resilience layers.
#[async_trait]
pub trait AccountFetcher: Send + Sync {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError>;
}

#[async_trait]
impl<T: AccountFetcher + ?Sized> AccountFetcher for Arc<T> {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        (**self).fetch(account_id).await
    }
}
