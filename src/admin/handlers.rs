use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use futures_util::future::join_all;
use serde::Serialize;
use std::time::Instant;

use crate::domain::AccountType;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::{BreakerSnapshot, CircuitState, SimulationProfile};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationAck {
    pub backend: String,
    pub simulation: SimulationProfile,
    pub acknowledged: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationAck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub removed: usize,
    pub acknowledged: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    pub name: String,
    pub kind: AccountType,
    pub healthy: bool,
    pub circuit: BreakerSnapshot,
    pub simulation: SimulationProfile,
}

#[derive(Debug, Serialize)]
pub struct CacheHealth {
    pub enabled: bool,
    pub connected: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub cache: CacheHealth,
    pub backends: Vec<BackendHealth>,
}

/// `POST /admin/backends/{name}/simulate`
pub async fn simulate(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<SimulationProfile>, JsonRejection>,
) -> Result<Json<SimulationAck>, ApiError> {
    let start = Instant::now();
    let result = apply_simulation(&state, name, body);
    let status = match &result {
        Ok(_) => 200,
        Err(e) => e.status.as_u16(),
    };
    metrics::record_request("admin_simulate", status, start);
    result.map(Json)
}

fn apply_simulation(
    state: &AppState,
    name: String,
    body: Result<Json<SimulationProfile>, JsonRejection>,
) -> Result<SimulationAck, ApiError> {
    let Json(profile) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let backend = state
        .aggregator
        .registry()
        .get(&name)
        .ok_or_else(|| ApiError::not_found("unknown_backend", format!("no backend named '{name}'")))?;

    backend.fault.set(profile.clone());
    tracing::warn!(
        backend = %name,
        mode = ?profile.mode,
        latency_ms = ?profile.latency_ms,
        failure_rate = ?profile.failure_rate,
        "Backend simulation changed"
    );

    Ok(SimulationAck {
        backend: name,
        simulation: profile,
        acknowledged: true,
    })
}

/// `POST /admin/cache/invalidate/{id}`
pub async fn invalidate(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<InvalidationAck>, ApiError> {
    let start = Instant::now();
    let result = state.aggregator.cache().invalidate(&account_id).await;
    metrics::record_request("admin_invalidate", if result.is_ok() { 200 } else { 503 }, start);

    Ok(Json(InvalidationAck {
        account_id: Some(account_id),
        removed: result?,
        acknowledged: true,
    }))
}

/// `POST /admin/cache/invalidate-all`
pub async fn invalidate_all(State(state): State<AppState>) -> Result<Json<InvalidationAck>, ApiError> {
    let start = Instant::now();
    let result = state.aggregator.cache().invalidate_all().await;
    metrics::record_request("admin_invalidate_all", if result.is_ok() { 200 } else { 503 }, start);

    Ok(Json(InvalidationAck {
        account_id: None,
        removed: result?,
        acknowledged: true,
    }))
}

/// `GET /admin/health`: probes every backend concurrently.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let start = Instant::now();
    let registry = state.aggregator.registry();

    let probes = registry.all().iter().map(|backend| async move {
        let healthy = !backend.fault.fails_health_check() && backend.adapter.health().await;
        metrics::record_backend_health(&backend.name, healthy);
        BackendHealth {
            name: backend.name.clone(),
            kind: backend.kind,
            healthy,
            circuit: backend.breaker.snapshot(),
            simulation: SimulationProfile::clone(&backend.fault.current()),
        }
    });
    let backends = join_all(probes).await;

    let cache = state.aggregator.cache();
    let cache = CacheHealth {
        enabled: cache.enabled(),
        connected: cache.connected().await,
    };

    let degraded = (cache.enabled && !cache.connected)
        || backends.iter().any(|b| {
            !b.healthy || b.circuit.state != CircuitState::Closed
        });

    metrics::record_request("admin_health", 200, start);
    Json(HealthReport {
        status: if degraded { "degraded" } else { "ok" },
        cache,
        backends,
    })
}
