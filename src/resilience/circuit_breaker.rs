//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: testing if backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= threshold within window
//! Open → Half-Open: after reset timeout
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails
//! ```
//!
//! # Design Decisions
//! - Per-backend circuit breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single probe in Half-Open (prevents hammering recovering backend)
//! - Admission hands out a permit; an abandoned probe frees its slot on drop

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::adapters::AccountFetcher;
use crate::config::CircuitBreakerConfig;
use crate::domain::{AccountSummary, AdapterError};
use crate::observability::metrics;

/// Runtime circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding used for monitoring.
    pub fn code(&self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug)]
struct CircuitInner {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

impl Default for CircuitInner {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            opened_at: None,
            probe_in_flight: false,
        }
    }
}

/// Point-in-time view for health reporting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_for_ms: Option<u64>,
}

/// Thread-safe circuit breaker for one backend.
#[derive(Debug)]
pub struct CircuitBreaker {
    backend: String,
    failure_threshold: u32,
    failure_window: Duration,
    reset_timeout: Duration,
    inner: Mutex<CircuitInner>,
}

impl CircuitBreaker {
    pub fn new(backend: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        let breaker = Self {
            backend: backend.into(),
            failure_threshold: config.failure_threshold.max(1),
            failure_window: Duration::from_secs(config.failure_window_secs),
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
            inner: Mutex::new(CircuitInner::default()),
        };
        metrics::record_circuit_state(&breaker.backend, CircuitState::Closed.code());
        breaker
    }

    fn lock(&self) -> MutexGuard<'_, CircuitInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, inner: &mut CircuitInner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        metrics::record_circuit_state(&self.backend, to.code());
        match to {
            CircuitState::Open => tracing::warn!(
                backend = %self.backend,
                from = ?from,
                consecutive_failures = inner.consecutive_failures,
                "Circuit opened"
            ),
            _ => tracing::info!(backend = %self.backend, from = ?from, to = ?to, "Circuit transition"),
        }
    }

    /// Ask to place a call. Fails fast with `CircuitOpen` when the backend is isolated.
    pub fn try_acquire(&self) -> Result<Permit<'_>, AdapterError> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Ok(Permit::new(self, false)),
            CircuitState::Open => {
                let can_probe = inner
                    .opened_at
                    .map(|opened_at| opened_at.elapsed() >= self.reset_timeout)
                    .unwrap_or(true);
                if can_probe {
                    self.transition(&mut inner, CircuitState::HalfOpen);
                    inner.probe_in_flight = true;
                    Ok(Permit::new(self, true))
                } else {
                    Err(AdapterError::CircuitOpen(self.backend.clone()))
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    Err(AdapterError::CircuitOpen(self.backend.clone()))
                } else {
                    inner.probe_in_flight = true;
                    Ok(Permit::new(self, true))
                }
            }
        }
    }

    fn on_success(&self, probe: bool) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::HalfOpen if probe => {
                inner.consecutive_failures = 0;
                inner.last_failure_at = None;
                inner.opened_at = None;
                inner.probe_in_flight = false;
                self.transition(&mut inner, CircuitState::Closed);
            }
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                inner.last_failure_at = None;
            }
            // Late results from calls admitted before the circuit opened.
            _ => {}
        }
    }

    fn on_failure(&self, probe: bool) {
        let mut inner = self.lock();
        let now = Instant::now();
        match inner.state {
            CircuitState::HalfOpen if probe => {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                inner.opened_at = Some(now);
                inner.probe_in_flight = false;
                self.transition(&mut inner, CircuitState::Open);
            }
            CircuitState::Closed => {
                let expired = inner
                    .last_failure_at
                    .map(|at| now.duration_since(at) > self.failure_window)
                    .unwrap_or(false);
                if expired {
                    inner.consecutive_failures = 0;
                }
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                inner.last_failure_at = Some(now);

                if inner.consecutive_failures >= self.failure_threshold {
                    inner.opened_at = Some(now);
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            _ => {}
        }
    }

    fn on_abandoned(&self, probe: bool) {
        if !probe {
            return;
        }
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            open_for_ms: inner.opened_at.map(|at| at.elapsed().as_millis() as u64),
        }
    }
}

/// Admission ticket for one call. Record the outcome, or drop it to abandon the call.
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            settled: false,
        }
    }

    pub fn is_probe(&self) -> bool {
        self.probe
    }

    /// Feed the call outcome back. A confirmed `NotFound` counts as a healthy answer.
    pub fn record<T>(mut self, result: &Result<T, AdapterError>) {
        self.settled = true;
        match result {
            Err(e) if e.counts_as_failure() => self.breaker.on_failure(self.probe),
            _ => self.breaker.on_success(self.probe),
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.on_abandoned(self.probe);
        }
    }
}

/// Decorator that runs every call through a breaker.
pub struct BreakerGuard<F> {
    inner: F,
    breaker: Arc<CircuitBreaker>,
}

impl<F> BreakerGuard<F> {
    pub fn new(inner: F, breaker: Arc<CircuitBreaker>) -> Self {
        Self { inner, breaker }
    }
}

#[async_trait]
impl<F: AccountFetcher> AccountFetcher for BreakerGuard<F> {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        let permit = match self.breaker.try_acquire() {
            Ok(permit) => permit,
            Err(e) => {
                tracing::debug!(backend = %self.breaker.backend, account_id = %account_id, "Rejected by open circuit");
                metrics::record_circuit_rejection(&self.breaker.backend);
                return Err(e);
            }
        };
        let result = self.inner.fetch(account_id).await;
        permit.record(&result);
        result
    }
}
