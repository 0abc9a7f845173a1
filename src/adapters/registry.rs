//! Backend registry and id resolution.
//!
//! # Responsibilities
//! - Build one adapter + resilience pipeline per configured backend
//! - Resolve an account id to its owning backend by id prefix
//! - Expose per-backend breaker and simulation state to the admin API
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest matching prefix wins; prefixes are pre-sorted by length
//! - One shared reqwest client so backends share a connection pool
//! - Explicit `None` for unknown ids rather than a silent default backend

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::{AccountFetcher, HttpAdapter};
use crate::config::{BackendConfig, GatewayConfig};
use crate::domain::{AccountType, GatewayError};
use crate::resilience::{
    AttemptTimeout, BreakerGuard, CircuitBreaker, FaultInjector, FaultSwitch, RetryExecutor,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything the gateway holds for one backend.
pub struct BackendHandle {
    pub name: String,
    pub kind: AccountType,
    pub adapter: Arc<HttpAdapter>,
    pub breaker: Arc<CircuitBreaker>,
    pub fault: Arc<FaultSwitch>,
    /// Retry → breaker → timeout → fault injection → adapter.
    pub pipeline: Arc<dyn AccountFetcher>,
}

impl std::fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendHandle")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("circuit", &self.breaker.state())
            .field("simulation", &self.fault.mode())
            .finish()
    }
}

impl BackendHandle {
    pub fn build(config: &BackendConfig, client: Client) -> Result<Self, GatewayError> {
        let adapter = Arc::new(HttpAdapter::new(config, client)?);
        let breaker = Arc::new(CircuitBreaker::new(&config.name, &config.circuit_breaker));
        let fault = Arc::new(FaultSwitch::new());

        let injected = FaultInjector::new(adapter.clone(), &config.name, fault.clone());
        let bounded = AttemptTimeout::new(injected, &config.name, config.attempt_timeout());
        let guarded = BreakerGuard::new(bounded, breaker.clone());
        let pipeline: Arc<dyn AccountFetcher> = Arc::new(RetryExecutor::new(
            guarded,
            &config.name,
            config.retry.clone(),
        ));

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            adapter,
            breaker,
            fault,
            pipeline,
        })
    }
}

/// Lookup table from backend name and id prefix to `BackendHandle`.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    backends: Vec<Arc<BackendHandle>>,
    by_name: HashMap<String, Arc<BackendHandle>>,
    /// (prefix, backend), longest prefix first.
    prefixes: Vec<(String, Arc<BackendHandle>)>,
}

impl AdapterRegistry {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        let mut registry = Self::default();
        for backend in &config.backends {
            let handle = BackendHandle::build(backend, client.clone())?;
            registry.insert(handle, backend.prefixes());
        }

        tracing::info!(
            backends = registry.backends.len(),
            prefixes = registry.prefixes.len(),
            "Adapter registry built"
        );
        Ok(registry)
    }

    /// Register a backend under the given id prefixes.
    pub fn insert(&mut self, handle: BackendHandle, prefixes: Vec<String>) {
        let handle = Arc::new(handle);
        self.by_name.insert(handle.name.clone(), handle.clone());
        for prefix in prefixes {
            self.prefixes.push((prefix, handle.clone()));
        }
        self.prefixes
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self.backends.push(handle);
    }

    /// Owning backend for an account id.
    pub fn resolve(&self, account_id: &str) -> Option<&Arc<BackendHandle>> {
        self.prefixes
            .iter()
            .find(|(prefix, _)| account_id.starts_with(prefix.as_str()))
            .map(|(_, handle)| handle)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<BackendHandle>> {
        self.by_name.get(name)
    }

    /// Backends in configuration order.
    pub fn all(&self) -> &[Arc<BackendHandle>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
