//! Domain model.
//!
//! # Data Flow
//! ```text
//! backend JSON
//!     → mapping (per-schema mapper)
//!     → AccountSummary (canonical)
//!     → AccountResult (one row, with status + latency)
//!     → MultiAccountResponse (rows in request order + overall status)
//! ```
//!
//! Errors travel as `AdapterError` until the aggregator folds them into rows.

pub mod account;
pub mod error;
pub mod response;

pub use account::{AccountStatus, AccountSummary, AccountType, Balance, Owner};
pub use error::{AdapterError, CacheError, GatewayError, MappingError};
pub use response::{AccountResult, ErrorDetail, MultiAccountResponse, OverallStatus, ResultStatus};
