//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Lookup for one account:
//!     → retries.rs (retry transient failures with backoff)
//!     → circuit_breaker.rs (fail fast when open, count every attempt)
//!     → timeouts.rs (hard deadline per attempt)
//!     → fault.rs (operator-driven simulation)
//!     → adapter
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend attempt has a deadline
//! - Retries only for transient failures (unavailable, timeout)
//! - Circuit breaker prevents cascading failures
//! - All resilience logic is composable `AccountFetcher` decorators

pub mod backoff;
pub mod circuit_breaker;
pub mod fault;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{BreakerGuard, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use fault::{FaultInjector, FaultSwitch, SimulationMode, SimulationProfile};
pub use retries::RetryExecutor;
pub use timeouts::AttemptTimeout;
