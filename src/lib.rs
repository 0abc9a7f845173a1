//! Account aggregation gateway library.
//!
//! Fronts heterogeneous backend account systems behind one canonical API,
//! with per-backend circuit breaking, retries, timeouts and a read-through
//! cache that reports partial success instead of failing whole requests.

// Core model
pub mod domain;
pub mod mapping;

// Backend access
pub mod adapters;
pub mod cache;
pub mod resilience;

// Orchestration and surfaces
pub mod admin;
pub mod aggregator;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod simulator;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
