//! Mock backend account systems.
//!
//! # Data Flow
//! ```text
//! mock-backends binary / integration tests
//!     → backend_router(kind) per schema family
//!         GET /accounts/{id} → 200 raw payload | 404
//!         GET /health        → 200
//! ```
//!
//! Each server speaks its family's proprietary schema, so the gateway's
//! mappers run against realistic payloads. Failure modes are injected on
//! the gateway side through the admin API, not here.

pub mod seed;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::AccountType;

#[derive(Clone)]
struct MockState {
    kind: AccountType,
    accounts: Arc<HashMap<String, Value>>,
}

/// Router serving the seeded accounts for one family.
pub fn backend_router(kind: AccountType) -> Router {
    let accounts = seed::accounts(kind)
        .into_iter()
        .map(|(id, payload)| (id.to_string(), payload))
        .collect();
    Router::new()
        .route("/accounts/{id}", get(get_account))
        .route("/health", get(health))
        .with_state(MockState {
            kind,
            accounts: Arc::new(accounts),
        })
}

async fn get_account(State(state): State<MockState>, Path(id): Path<String>) -> Response {
    match state.accounts.get(&id) {
        Some(payload) => {
            tracing::debug!(backend = %state.kind, account_id = %id, "Mock backend hit");
            Json(payload.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "no such account"}))).into_response(),
    }
}

async fn health(State(state): State<MockState>) -> Json<Value> {
    Json(json!({"status": "ok", "backend": state.kind.as_str()}))
}

/// A mock backend bound to a local port.
pub struct MockBackend {
    pub kind: AccountType,
    pub addr: SocketAddr,
    pub handle: JoinHandle<()>,
}

impl MockBackend {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Bind `addr` (port 0 for ephemeral) and serve `kind` until `shutdown` fires.
pub async fn spawn(
    kind: AccountType,
    addr: SocketAddr,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<MockBackend> {
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    let router = backend_router(kind);

    let handle = tokio::spawn(async move {
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;
        if let Err(e) = served {
            tracing::error!(backend = %kind, error = %e, "Mock backend stopped with error");
        }
    });

    tracing::info!(backend = %kind, address = %addr, "Mock backend listening");
    Ok(MockBackend { kind, addr, handle })
}
