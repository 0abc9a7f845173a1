//! Error taxonomy shared by adapters, resilience layers and the cache.

use std::time::Duration;
use thiserror::Error;

/// A backend payload that does not match the expected schema.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{backend} payload rejected: {reason}")]
pub struct MappingError {
    pub backend: String,
    pub reason: String,
}

impl MappingError {
    pub fn new(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single account fetch, at any layer of the pipeline.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdapterError {
    /// The backend confirmed the account does not exist.
    #[error("account {0} not found")]
    NotFound(String),

    /// Network failure, 5xx, or simulated outage.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A single attempt exceeded its deadline.
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    /// The breaker rejected the call without touching the network.
    #[error("circuit open for backend {0}")]
    CircuitOpen(String),

    /// Every permitted attempt failed with a transient error.
    #[error("backend unavailable after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<AdapterError>,
    },

    /// Payload did not match the backend's data contract.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl AdapterError {
    /// Transient failures are eligible for retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdapterError::Unavailable(_) | AdapterError::Timeout(_))
    }

    /// Whether the failure counts against the backend's circuit breaker.
    ///
    /// A confirmed absence is a healthy answer from the backend.
    pub fn counts_as_failure(&self) -> bool {
        !matches!(self, AdapterError::NotFound(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdapterError::NotFound(_))
    }

    /// Precise failure cause for logs and metric labels. API bodies only
    /// distinguish `not_found` from `unavailable`.
    pub fn code(&self) -> &'static str {
        match self {
            AdapterError::NotFound(_) => "not_found",
            AdapterError::Unavailable(_) => "unavailable",
            AdapterError::Timeout(_) => "timeout",
            AdapterError::CircuitOpen(_) => "circuit_open",
            AdapterError::RetriesExhausted { .. } => "retries_exhausted",
            AdapterError::Mapping(_) => "mapping_error",
        }
    }
}

/// Failure talking to the cache store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("cache store unreachable: {0}")]
    Unavailable(String),

    #[error("cache entry could not be decoded: {0}")]
    Corrupt(String),
}

/// Request-level failures that never reach a backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::loader::ConfigError),

    #[error("failed to build backend client: {0}")]
    Client(#[from] reqwest::Error),
}
