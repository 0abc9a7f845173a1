//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, adapter calls, cache, breaker, retries)
//! - Expose Prometheus-compatible text on `GET /metrics`
//! - Track per-backend and aggregate metrics
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by endpoint, status
//! - `gateway_request_duration_seconds` (histogram): latency by endpoint
//! - `gateway_adapter_calls_total` (counter): backend calls by backend, outcome
//! - `gateway_adapter_call_duration_seconds` (histogram): backend latency
//! - `gateway_cache_{hits,misses,stale}_total` (counter)
//! - `gateway_cache_errors_total` (counter): store failures by operation
//! - `gateway_cache_connected` (gauge): 1=reachable, 0=unreachable
//! - `gateway_circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half_open
//! - `gateway_circuit_rejections_total` (counter): calls refused by an open breaker
//! - `gateway_backend_timeouts_total`, `gateway_backend_retries_total` (counter)
//! - `gateway_lookup_failures_total` (counter): failed lookups by backend, reason
//! - `gateway_partial_responses_total` (counter)
//! - `gateway_backend_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Recorder installed once per process; every recording helper is a no-op
//!   until then
//! - Histogram buckets tuned for backend calls in the 5ms–10s range

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder and return a render handle.
///
/// Returns `None` when another recorder already owns the global slot.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| {
            let installed = PrometheusBuilder::new()
                .set_buckets_for_metric(
                    Matcher::Suffix("duration_seconds".to_string()),
                    LATENCY_BUCKETS,
                )
                .and_then(|builder| builder.install_recorder());

            match installed {
                Ok(handle) => {
                    describe_all();
                    tracing::info!("Prometheus recorder installed");
                    Some(handle)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install Prometheus recorder");
                    None
                }
            }
        })
        .clone()
}

fn describe_all() {
    describe_counter!("gateway_requests_total", "Inbound API requests");
    describe_histogram!(
        "gateway_request_duration_seconds",
        metrics::Unit::Seconds,
        "Inbound API request latency"
    );
    describe_counter!("gateway_adapter_calls_total", "Backend calls by outcome");
    describe_histogram!(
        "gateway_adapter_call_duration_seconds",
        metrics::Unit::Seconds,
        "Backend call latency"
    );
    describe_counter!("gateway_cache_hits_total", "Fresh cache hits");
    describe_counter!("gateway_cache_misses_total", "Cache misses");
    describe_counter!("gateway_cache_stale_total", "Stale entries served after a failed refresh");
    describe_counter!("gateway_cache_errors_total", "Cache store failures");
    describe_gauge!("gateway_cache_connected", "Cache store reachability");
    describe_gauge!(
        "gateway_circuit_breaker_state",
        "Circuit state per backend (0=closed, 1=open, 2=half_open)"
    );
    describe_counter!("gateway_circuit_rejections_total", "Calls refused by an open circuit");
    describe_counter!(
        "gateway_lookup_failures_total",
        "Failed account lookups by cause (circuit_open, retries_exhausted, ...)"
    );
    describe_counter!("gateway_backend_timeouts_total", "Backend attempts that hit their deadline");
    describe_counter!("gateway_backend_retries_total", "Backend retries issued");
    describe_counter!("gateway_partial_responses_total", "Multi-account responses mixing data and failures");
    describe_gauge!("gateway_backend_health", "Backend health probe result");
}

/// Record an inbound API request.
pub fn record_request(endpoint: &'static str, status: u16, start: Instant) {
    counter!("gateway_requests_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
    histogram!("gateway_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// Record one backend call attempt.
pub fn record_adapter_call(backend: &str, outcome: &'static str, elapsed: Duration) {
    counter!("gateway_adapter_calls_total", "backend" => backend.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("gateway_adapter_call_duration_seconds", "backend" => backend.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_cache_hit() {
    counter!("gateway_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("gateway_cache_misses_total").increment(1);
}

pub fn record_cache_stale() {
    counter!("gateway_cache_stale_total").increment(1);
}

pub fn record_cache_error(op: &'static str) {
    counter!("gateway_cache_errors_total", "op" => op).increment(1);
}

pub fn set_cache_connected(connected: bool) {
    gauge!("gateway_cache_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_circuit_state(backend: &str, code: u8) {
    gauge!("gateway_circuit_breaker_state", "backend" => backend.to_string()).set(f64::from(code));
}

pub fn record_circuit_rejection(backend: &str) {
    counter!("gateway_circuit_rejections_total", "backend" => backend.to_string()).increment(1);
}

/// Record why a lookup failed. This is the only place the cause is visible.
pub fn record_lookup_failure(backend: &str, reason: &'static str) {
    counter!("gateway_lookup_failures_total", "backend" => backend.to_string(), "reason" => reason)
        .increment(1);
}

pub fn record_timeout(backend: &str) {
    counter!("gateway_backend_timeouts_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_retry(backend: &str) {
    counter!("gateway_backend_retries_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_partial_response() {
    counter!("gateway_partial_responses_total").increment(1);
}

pub fn record_backend_health(backend: &str, healthy: bool) {
    gauge!("gateway_backend_health", "backend" => backend.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
