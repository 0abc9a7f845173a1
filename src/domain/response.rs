//! Aggregated response shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::account::AccountSummary;
use crate::domain::error::AdapterError;

/// Per-account outcome inside an aggregated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Ok,
    NotFound,
    Unavailable,
    /// Data present but degraded (served from an expired cache entry).
    Partial,
}

/// Machine-readable failure detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
        }
    }
}

/// Callers only learn whether an account is missing or unreachable. The
/// precise cause (`AdapterError::code`) goes to logs and metrics.
impl From<&AdapterError> for ErrorDetail {
    fn from(err: &AdapterError) -> Self {
        if err.is_not_found() {
            Self::new(NOT_FOUND, err.to_string())
        } else {
            Self::new(UNAVAILABLE, "backend is temporarily unavailable")
        }
    }
}

pub const NOT_FOUND: &str = "not_found";
pub const UNAVAILABLE: &str = "unavailable";

/// Metadata key holding the id a backend reported when it differs from the requested one.
pub const BACKEND_ACCOUNT_ID: &str = "backendAccountId";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResult {
    pub account_id: String,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AccountSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    pub latency_ms: u64,
}

impl AccountResult {
    /// Row for a successfully resolved account. Stale data is reported as `partial`.
    ///
    /// The row and its data always carry the requested id; a differing id
    /// from the backend is kept under `metadata.backendAccountId`.
    pub fn found(account_id: impl Into<String>, mut summary: AccountSummary, latency_ms: u64) -> Self {
        let account_id = account_id.into();
        if summary.account_id != account_id {
            let reported = std::mem::replace(&mut summary.account_id, account_id.clone());
            summary
                .metadata
                .insert(BACKEND_ACCOUNT_ID.to_string(), Value::String(reported));
        }
        let status = if summary.stale {
            ResultStatus::Partial
        } else {
            ResultStatus::Ok
        };
        Self {
            account_id,
            status,
            data: Some(summary),
            error: None,
            latency_ms,
        }
    }

    pub fn failed(account_id: impl Into<String>, err: &AdapterError, latency_ms: u64) -> Self {
        let status = if err.is_not_found() {
            ResultStatus::NotFound
        } else {
            ResultStatus::Unavailable
        };
        Self {
            account_id: account_id.into(),
            status,
            data: None,
            error: Some(ErrorDetail::from(err)),
            latency_ms,
        }
    }

    /// Row for a failure decided before any backend call.
    pub fn rejected(
        account_id: impl Into<String>,
        status: ResultStatus,
        detail: ErrorDetail,
        latency_ms: u64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            status,
            data: None,
            error: Some(detail),
            latency_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Ok,
    Partial,
    Error,
}

impl OverallStatus {
    /// `ok` when every row is ok, `error` when no row carries data, `partial` otherwise.
    pub fn derive(results: &[AccountResult]) -> Self {
        if results.iter().all(|r| r.status == ResultStatus::Ok) {
            OverallStatus::Ok
        } else if results
            .iter()
            .all(|r| matches!(r.status, ResultStatus::NotFound | ResultStatus::Unavailable))
        {
            OverallStatus::Error
        } else {
            OverallStatus::Partial
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAccountResponse {
    pub request_id: String,
    pub overall_status: OverallStatus,
    pub results: Vec<AccountResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}
