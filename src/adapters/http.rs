//! HTTP backend adapter.
//!
//! # Responsibilities
//! - Issue exactly one GET per fetch, with the backend's auth header
//! - Classify the response (404, 5xx, transport error, malformed body)
//! - Delegate the body to the backend's mapper
//! - Report call outcome and latency

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use url::Url;

use crate::adapters::AccountFetcher;
use crate::config::BackendConfig;
use crate::domain::{AccountSummary, AccountType, AdapterError, GatewayError, MappingError};
use crate::mapping;
use crate::observability::metrics;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Adapter for one backend account system.
#[derive(Debug, Clone)]
pub struct HttpAdapter {
    name: String,
    kind: AccountType,
    source: String,
    base_url: Url,
    account_path: String,
    health_path: String,
    auth: Option<(HeaderName, HeaderValue)>,
    client: Client,
}

impl HttpAdapter {
    pub fn new(config: &BackendConfig, client: Client) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            GatewayError::Validation(format!("backend '{}' base_url: {}", config.name, e))
        })?;

        let auth = match &config.auth_token {
            Some(token) => {
                let name = HeaderName::from_bytes(config.auth_header.as_bytes()).map_err(|e| {
                    GatewayError::Validation(format!("backend '{}' auth_header: {}", config.name, e))
                })?;
                let mut value = HeaderValue::from_str(token).map_err(|e| {
                    GatewayError::Validation(format!("backend '{}' auth_token: {}", config.name, e))
                })?;
                value.set_sensitive(true);
                Some((name, value))
            }
            None => None,
        };

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            source: config.source_label(),
            base_url,
            account_path: config.account_path.clone(),
            health_path: config.health_path.clone(),
            auth,
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AccountType {
        self.kind
    }

    fn account_url(&self, account_id: &str) -> Result<Url, AdapterError> {
        let encoded: String = url::form_urlencoded::byte_serialize(account_id.as_bytes()).collect();
        let path = self.account_path.replace("{id}", &encoded);
        self.base_url
            .join(&path)
            .map_err(|e| AdapterError::Unavailable(format!("{}: bad account url: {}", self.name, e)))
    }

    /// Probe the backend's health endpoint.
    pub async fn health(&self) -> bool {
        let Ok(url) = self.base_url.join(&self.health_path) else {
            return false;
        };
        let mut request = self.client.get(url).timeout(HEALTH_TIMEOUT);
        if let Some((name, value)) = &self.auth {
            request = request.header(name.clone(), value.clone());
        }
        match request.send().await {
            Ok(response) => {
                let healthy = response.status().is_success();
                if !healthy {
                    tracing::warn!(backend = %self.name, status = %response.status(), "Health check failed: non-success status");
                }
                healthy
            }
            Err(e) => {
                tracing::warn!(backend = %self.name, error = %e, "Health check failed: connection error");
                false
            }
        }
    }

    async fn call(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        let url = self.account_url(account_id)?;
        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some((name, value)) = &self.auth {
            request = request.header(name.clone(), value.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::Unavailable(format!("{}: {}", self.name, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AdapterError::NotFound(account_id.to_string()));
        }
        if !status.is_success() {
            return Err(AdapterError::Unavailable(format!(
                "{} returned {}",
                self.name, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AdapterError::Unavailable(format!("{}: body read failed: {}", self.name, e)))?;

        let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
            MappingError::new(&self.source, format!("body is not JSON: {e}"))
        })?;

        mapping::map_payload(self.kind, payload, &self.source).map_err(AdapterError::from)
    }
}

#[async_trait]
impl AccountFetcher for HttpAdapter {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        let start = Instant::now();
        let result = self.call(account_id).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AdapterError::NotFound(_)) => "not_found",
            Err(AdapterError::Mapping(e)) => {
                tracing::warn!(
                    backend = %self.name,
                    account_id = %account_id,
                    reason = %e.reason,
                    "Backend payload violates data contract"
                );
                "mapping_error"
            }
            Err(e) => {
                tracing::debug!(backend = %self.name, account_id = %account_id, error = %e, "Backend call failed");
                "unavailable"
            }
        };
        metrics::record_adapter_call(&self.name, outcome, start.elapsed());

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AccountStatus;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn adapter_for(server: &MockServer, kind: AccountType) -> HttpAdapter {
        let mut config = BackendConfig::new(kind.as_str(), kind, server.uri());
        config.auth_header = "x-api-key".into();
        config.auth_token = Some("s3cret".into());
        HttpAdapter::new(&config, Client::new()).unwrap()
    }

    #[tokio::test]
    async fn fetch_maps_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/LN-42"))
            .and(header("x-api-key", "s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "loanId": "LN-42",
                "borrowerName": "Ada",
                "outstandingBalance": 900,
                "status": "current"
            })))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server, AccountType::Loan).await;
        let summary = adapter.fetch("LN-42").await.unwrap();
        assert_eq!(summary.account_id, "LN-42");
        assert_eq!(summary.status, AccountStatus::Active);
        assert_eq!(summary.backend_source, "loan-adapter/v1");
    }

    #[tokio::test]
    async fn classifies_http_failures() {
        let server = MockServer::start().await;
        Mock::given(path("/accounts/BNK-404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/accounts/BNK-500"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(path("/accounts/BNK-BAD"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let adapter = adapter_for(&server, AccountType::Bank).await;
        assert!(matches!(
            adapter.fetch("BNK-404").await,
            Err(AdapterError::NotFound(id)) if id == "BNK-404"
        ));
        assert!(matches!(
            adapter.fetch("BNK-500").await,
            Err(AdapterError::Unavailable(_))
        ));
        assert!(matches!(
            adapter.fetch("BNK-BAD").await,
            Err(AdapterError::Mapping(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        let config = BackendConfig::new("bank", AccountType::Bank, "http://127.0.0.1:9");
        let adapter = HttpAdapter::new(&config, Client::new()).unwrap();
        assert!(matches!(
            adapter.fetch("BNK-1").await,
            Err(AdapterError::Unavailable(_))
        ));
        assert!(!adapter.health().await);
    }

    #[tokio::test]
    async fn health_reflects_probe_status() {
        let server = MockServer::start().await;
        Mock::given(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        let adapter = adapter_for(&server, AccountType::Crypto).await;
        assert!(adapter.health().await);
    }

    #[test]
    fn rejects_invalid_auth_header() {
        let mut config = BackendConfig::new("bank", AccountType::Bank, "http://127.0.0.1:1");
        config.auth_header = "bad header".into();
        config.auth_token = Some("x".into());
        assert!(HttpAdapter::new(&config, Client::new()).is_err());
    }
}
