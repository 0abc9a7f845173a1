//! Aggregation subsystem.
//!
//! # Data Flow
//! ```text
//! ids (request order)
//!     → ids.rs (validate, 400 before any backend call)
//!     → service.rs, per id concurrently:
//!         registry.resolve(id) → cache.lookup(kind, id, pipeline, mode)
//!         → AccountResult { status, data | error, latencyMs }
//!     → join all → MultiAccountResponse { overallStatus, results in order }
//! ```
//!
//! # Design Decisions
//! - No early return: every id's outcome is awaited independently
//! - Each id is bounded by its own deadline, so the slowest pipeline sets
//!   the worst-case latency
//! - Registry and cache are injected at construction

pub mod ids;
pub mod service;

pub use ids::{parse_id_list, validate_account_id};
pub use service::Aggregator;
