//! Typed client for the account gateway API.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway returned {status} ({code}): {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },
}

impl SdkError {
    /// HTTP status and error code for API errors.
    pub fn api(&self) -> Option<(StatusCode, &str)> {
        match self {
            SdkError::Api { status, code, .. } => Some((*status, code.as_str())),
            SdkError::Transport(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub available: f64,
    #[serde(default)]
    pub ledger: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub account_type: String,
    #[serde(default)]
    pub owner: Owner,
    pub display_name: String,
    pub balances: Vec<Balance>,
    pub status: String,
    pub backend_source: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub stale: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResult {
    pub account_id: String,
    pub status: String,
    #[serde(default)]
    pub data: Option<AccountSummary>,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAccountResponse {
    pub request_id: String,
    pub overall_status: String,
    pub results: Vec<AccountResult>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_rate: Option<f64>,
}

impl SimulationRequest {
    pub fn mode(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            latency_ms: None,
            failure_rate: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationAck {
    #[serde(default)]
    pub account_id: Option<String>,
    pub removed: usize,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    pub name: String,
    pub kind: String,
    pub healthy: bool,
    pub circuit: Value,
    pub simulation: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub cache: Value,
    pub backends: Vec<BackendHealth>,
}

impl HealthReport {
    pub fn backend(&self, name: &str) -> Option<&BackendHealth> {
        self.backends.iter().find(|b| b.name == name)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

pub struct GatewayClient {
    client: Client,
    base_url: String,
    admin_key: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key: None,
        }
    }

    /// Send `Authorization: Bearer <key>` on admin calls.
    pub fn with_admin_key(mut self, key: &str) -> Self {
        self.admin_key = Some(key.to_string());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /v1/accounts/{id}`
    pub async fn get_account(&self, id: &str, no_cache: bool) -> Result<AccountSummary, SdkError> {
        let mut request = self.client.get(format!("{}/v1/accounts/{}", self.base_url, id));
        if no_cache {
            request = request.query(&[("noCache", "true")]);
        }
        decode(request).await
    }

    /// `GET /v1/accounts?ids=...`
    pub async fn get_accounts(&self, ids: &[&str], no_cache: bool) -> Result<MultiAccountResponse, SdkError> {
        let joined = ids.join(",");
        let mut request = self
            .client
            .get(format!("{}/v1/accounts", self.base_url))
            .query(&[("ids", joined.as_str())]);
        if no_cache {
            request = request.query(&[("noCache", "true")]);
        }
        decode(request).await
    }

    /// `POST /admin/backends/{name}/simulate`
    pub async fn simulate(&self, backend: &str, simulation: &SimulationRequest) -> Result<Value, SdkError> {
        let request = self
            .admin(self.client.post(format!("{}/admin/backends/{}/simulate", self.base_url, backend)))
            .json(simulation);
        decode(request).await
    }

    /// `POST /admin/cache/invalidate/{id}`
    pub async fn invalidate(&self, id: &str) -> Result<InvalidationAck, SdkError> {
        let request = self.admin(
            self.client
                .post(format!("{}/admin/cache/invalidate/{}", self.base_url, id)),
        );
        decode(request).await
    }

    /// `POST /admin/cache/invalidate-all`
    pub async fn invalidate_all(&self) -> Result<InvalidationAck, SdkError> {
        let request = self.admin(
            self.client
                .post(format!("{}/admin/cache/invalidate-all", self.base_url)),
        );
        decode(request).await
    }

    /// `GET /admin/health`
    pub async fn health(&self) -> Result<HealthReport, SdkError> {
        let request = self.admin(self.client.get(format!("{}/admin/health", self.base_url)));
        decode(request).await
    }

    /// `GET /metrics` as Prometheus text.
    pub async fn metrics(&self) -> Result<String, SdkError> {
        let resp = self
            .client
            .get(format!("{}/metrics", self.base_url))
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &text));
        }
        Ok(text)
    }

    fn admin(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.admin_key {
            Some(key) => request.header(AUTHORIZATION, format!("Bearer {key}")),
            None => request,
        }
    }
}

async fn decode<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SdkError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await?;
        return Err(api_error(status, &text));
    }
    Ok(resp.json::<T>().await?)
}

fn api_error(status: StatusCode, body: &str) -> SdkError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => SdkError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message.unwrap_or_default(),
        },
        Err(_) => SdkError::Api {
            status,
            code: "unknown".to_string(),
            message: body.to_string(),
        },
    }
}
