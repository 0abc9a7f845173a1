//! Admin and simulation surface.
//!
//! # Routes
//! ```text
//! GET  /admin/health                      concurrent backend probes + breaker state
//! POST /admin/backends/{name}/simulate    {mode, latencyMs?, failureRate?}
//! POST /admin/cache/invalidate/{id}
//! POST /admin/cache/invalidate-all
//! ```
//!
//! All routes pass through `auth.rs`; it only enforces a bearer token when
//! `admin.api_key` is configured.

pub mod auth;
pub mod handlers;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/health", get(health))
        .route("/admin/backends/{name}/simulate", post(simulate))
        .route("/admin/cache/invalidate/{id}", post(invalidate))
        .route("/admin/cache/invalidate-all", post(invalidate_all))
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
