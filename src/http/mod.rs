//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout, body limit)
//!     → request.rs (request/trace IDs, noCache flag)
//!     → accounts.rs (account handlers → aggregator)
//!     → admin (simulate, invalidate, health)
//!     → response.rs (JSON bodies, {"error": {...}} on failure)
//!     → Send to client
//! ```

pub mod accounts;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID, X_TRACE_ID};
pub use response::ApiError;
pub use server::{AppState, GatewayServer};
