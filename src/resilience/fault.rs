//! Simulated backend failure modes.
//!
//! Operators flip a backend into `slow`, `error` or `flaky` through the admin
//! API. The injector sits directly around the adapter, inside the attempt
//! timeout, so simulated latency trips real timeouts and breaker counts.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::AccountFetcher;
use crate::domain::{AccountSummary, AdapterError};

const DEFAULT_LATENCY_MS: u64 = 2_000;
const DEFAULT_FAILURE_RATE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    Healthy,
    Slow,
    Error,
    Flaky,
}

/// Requested simulation, as accepted by `POST /admin/backends/{name}/simulate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationProfile {
    pub mode: SimulationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_rate: Option<f64>,
}

impl SimulationProfile {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms.unwrap_or(DEFAULT_LATENCY_MS))
    }

    pub fn failure_rate(&self) -> f64 {
        let rate = self.failure_rate.unwrap_or(DEFAULT_FAILURE_RATE);
        if rate.is_finite() {
            rate.clamp(0.0, 1.0)
        } else {
            DEFAULT_FAILURE_RATE
        }
    }
}

/// Current simulation for one backend, swapped atomically by the admin API.
#[derive(Debug, Default)]
pub struct FaultSwitch {
    profile: ArcSwap<SimulationProfile>,
}

impl FaultSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, profile: SimulationProfile) {
        self.profile.store(Arc::new(profile));
    }

    pub fn current(&self) -> Arc<SimulationProfile> {
        self.profile.load_full()
    }

    pub fn mode(&self) -> SimulationMode {
        self.profile.load().mode
    }

    /// Whether a health check should report failure under the current
    /// simulation. `error` always fails, `flaky` fails at its failure rate,
    /// `slow` and `healthy` defer to the real check.
    pub fn fails_health_check(&self) -> bool {
        let profile = self.profile.load();
        match profile.mode {
            SimulationMode::Error => true,
            SimulationMode::Flaky => fastrand::f64() < profile.failure_rate(),
            SimulationMode::Healthy | SimulationMode::Slow => false,
        }
    }
}

/// Decorator that applies the backend's current simulation before calling through.
pub struct FaultInjector<F> {
    inner: F,
    backend: String,
    switch: Arc<FaultSwitch>,
}

impl<F> FaultInjector<F> {
    pub fn new(inner: F, backend: impl Into<String>, switch: Arc<FaultSwitch>) -> Self {
        Self {
            inner,
            backend: backend.into(),
            switch,
        }
    }
}

#[async_trait]
impl<F: AccountFetcher> AccountFetcher for FaultInjector<F> {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        let profile = self.switch.current();
        match profile.mode {
            SimulationMode::Healthy => {}
            SimulationMode::Slow => tokio::time::sleep(profile.latency()).await,
            SimulationMode::Error => {
                return Err(AdapterError::Unavailable(format!(
                    "{}: simulated outage",
                    self.backend
                )));
            }
            SimulationMode::Flaky => {
                if fastrand::f64() < profile.failure_rate() {
                    return Err(AdapterError::Unavailable(format!(
                        "{}: simulated flaky failure",
                        self.backend
                    )));
                }
            }
        }
        self.inner.fetch(account_id).await
    }
}
