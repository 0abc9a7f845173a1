//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::AccountType;

/// Root configuration for the account gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound request timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Read-through cache policy.
    pub cache: CacheConfig,

    /// Multi-account fan-out limits.
    pub aggregator: AggregatorConfig,

    /// Admin surface settings.
    pub admin: AdminConfig,

    /// Backend account systems, one adapter each.
    pub backends: Vec<BackendConfig>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            cache: CacheConfig::default(),
            aggregator: AggregatorConfig::default(),
            admin: AdminConfig::default(),
            backends: default_backends(),
        }
    }
}

/// Six local backends matching the ports used by the `mock-backends` binary.
fn default_backends() -> Vec<BackendConfig> {
    AccountType::ALL
        .iter()
        .zip(9101u16..)
        .map(|(kind, port)| {
            BackendConfig::new(kind.as_str(), *kind, format!("http://127.0.0.1:{port}"))
        })
        .collect()
}

/// Conventional id prefix per backend family.
pub fn default_prefix(kind: AccountType) -> &'static str {
    match kind {
        AccountType::Bank => "BNK-",
        AccountType::CreditCard => "CC-",
        AccountType::Loan => "LN-",
        AccountType::Investment => "INV-",
        AccountType::Legacy => "LEG-",
        AccountType::Crypto => "CRY-",
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Maximum admin request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Pretty for development, JSON for production.
    pub log_format: LogFormat,

    /// Expose `GET /metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "account_gateway=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

/// Cache policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Disable to send every lookup to the backend pipeline.
    pub enabled: bool,

    /// Freshness window in seconds.
    pub ttl_secs: u64,

    /// How long past the TTL an entry may still be served as stale.
    pub max_stale_secs: u64,

    /// Lifetime of negative (not found) entries. Zero disables negative caching.
    pub negative_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 60,
            max_stale_secs: 3600,
            negative_ttl_secs: 0,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn max_stale(&self) -> Duration {
        Duration::from_secs(self.max_stale_secs)
    }

    pub fn negative_ttl(&self) -> Option<Duration> {
        (self.negative_ttl_secs > 0).then(|| Duration::from_secs(self.negative_ttl_secs))
    }
}

/// Multi-account request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Maximum ids accepted by the multi-account endpoint.
    pub max_ids: usize,

    /// Upper bound for each per-id lookup in milliseconds.
    pub per_account_deadline_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_ids: 50,
            per_account_deadline_ms: 5_000,
        }
    }
}

/// Admin surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin routes.
    pub enabled: bool,

    /// Bearer token required on admin routes. Unset means no auth.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
        }
    }
}

/// Backend account system configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier, used in admin routes and metric labels.
    pub name: String,

    /// Schema family, selects the mapper.
    pub kind: AccountType,

    /// Base URL (e.g., "http://bank-core.internal:8080").
    pub base_url: String,

    /// Path template for account lookups; `{id}` is replaced.
    #[serde(default = "default_account_path")]
    pub account_path: String,

    /// Path probed by health checks.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Account id prefixes owned by this backend. Empty means the family's
    /// conventional prefix (`BNK-`, `CC-`, ...).
    #[serde(default)]
    pub id_prefixes: Vec<String>,

    /// Header carrying the backend credential.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,

    /// Credential value sent in `auth_header`.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Schema version reported in `backendSource`.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Deadline for a single attempt in milliseconds.
    #[serde(default = "default_attempt_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

fn default_account_path() -> String {
    "/accounts/{id}".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_auth_header() -> String {
    "authorization".to_string()
}

fn default_schema_version() -> String {
    "v1".to_string()
}

fn default_attempt_timeout_ms() -> u64 {
    1_000
}

impl BackendConfig {
    /// Backend with default paths and resilience settings.
    pub fn new(name: impl Into<String>, kind: AccountType, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            base_url: base_url.into(),
            account_path: default_account_path(),
            health_path: default_health_path(),
            id_prefixes: vec![default_prefix(kind).to_string()],
            auth_header: default_auth_header(),
            auth_token: None,
            schema_version: default_schema_version(),
            timeout_ms: default_attempt_timeout_ms(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }

    /// Prefixes used for id resolution.
    pub fn prefixes(&self) -> Vec<String> {
        if self.id_prefixes.is_empty() {
            vec![default_prefix(self.kind).to_string()]
        } else {
            self.id_prefixes.clone()
        }
    }

    /// `backendSource` value stamped on every mapped record.
    pub fn source_label(&self) -> String {
        format!("{}-adapter/{}", self.kind.as_str(), self.schema_version)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the initial attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Circuit breaker thresholds and timers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Failures older than this no longer count toward the threshold.
    pub failure_window_secs: u64,

    /// Time spent open before a probe is allowed, in milliseconds.
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window_secs: 60,
            reset_timeout_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_backend_family() {
        let config = GatewayConfig::default();
        assert_eq!(config.backends.len(), 6);
        assert_eq!(config.backends[0].base_url, "http://127.0.0.1:9101");
        assert_eq!(config.backends[5].kind, AccountType::Crypto);
        assert_eq!(config.backends[5].id_prefixes, vec!["CRY-".to_string()]);
    }

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[backends]]
            name = "core-bank"
            kind = "bank"
            base_url = "http://10.0.0.5:8080"

            [backends.circuit_breaker]
            failure_threshold = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.backends.len(), 1);
        let bank = &config.backends[0];
        assert_eq!(bank.account_path, "/accounts/{id}");
        assert_eq!(bank.circuit_breaker.failure_threshold, 2);
        assert_eq!(bank.circuit_breaker.reset_timeout_ms, 30_000);
        assert_eq!(bank.retry.max_retries, 2);
        assert_eq!(bank.source_label(), "bank-adapter/v1");
        assert_eq!(bank.prefixes(), vec!["BNK-".to_string()]);
        assert_eq!(config.cache.negative_ttl(), None);
    }
}
