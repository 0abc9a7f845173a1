//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check backend identity (unique names, unique id prefixes; overlaps resolve by longest match)
//! - Validate value ranges (timeouts > 0, thresholds >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::{BackendConfig, GatewayConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("duplicate backend name '{0}'")]
    DuplicateBackend(String),

    #[error("backend '{backend}': {reason}")]
    InvalidBackend { backend: String, reason: String },

    #[error("id prefix '{prefix}' is claimed by both '{first}' and '{second}'")]
    PrefixConflict {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    if config.aggregator.max_ids == 0 {
        errors.push(ValidationError::NotPositive {
            field: "aggregator.max_ids",
        });
    }
    if config.aggregator.per_account_deadline_ms == 0 {
        errors.push(ValidationError::NotPositive {
            field: "aggregator.per_account_deadline_ms",
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive {
            field: "timeouts.request_secs",
        });
    }

    let mut names = HashSet::new();
    let mut prefixes: Vec<(String, String)> = Vec::new();
    for backend in &config.backends {
        if !names.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
        validate_backend(backend, &mut errors);

        for prefix in backend.prefixes() {
            if let Some((_, owner)) = prefixes.iter().find(|(p, _)| *p == prefix) {
                errors.push(ValidationError::PrefixConflict {
                    prefix: prefix.clone(),
                    first: owner.clone(),
                    second: backend.name.clone(),
                });
            } else {
                prefixes.push((prefix, backend.name.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_backend(backend: &BackendConfig, errors: &mut Vec<ValidationError>) {
    let mut invalid = |reason: String| {
        errors.push(ValidationError::InvalidBackend {
            backend: backend.name.clone(),
            reason,
        })
    };

    if backend.name.trim().is_empty() {
        invalid("name must not be empty".to_string());
    }
    if let Err(e) = Url::parse(&backend.base_url) {
        invalid(format!("base_url '{}' is invalid: {}", backend.base_url, e));
    }
    if !backend.account_path.contains("{id}") {
        invalid("account_path must contain '{id}'".to_string());
    }
    if backend.id_prefixes.iter().any(|p| p.is_empty()) {
        invalid("id prefixes must not be empty".to_string());
    }
    if backend.timeout_ms == 0 {
        invalid("timeout_ms must be greater than zero".to_string());
    }
    if backend.circuit_breaker.failure_threshold == 0 {
        invalid("circuit_breaker.failure_threshold must be at least 1".to_string());
    }
    if backend.circuit_breaker.reset_timeout_ms == 0 {
        invalid("circuit_breaker.reset_timeout_ms must be greater than zero".to_string());
    }
}
