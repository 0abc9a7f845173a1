//! API error responses.
//!
//! # Responsibilities
//! - Render every failure as `{"error": {"code", "message"}}`
//! - Map gateway, cache and per-account failures to HTTP status codes
//!
//! # Design Decisions
//! - Validation failures are 400 and never reach a backend
//! - A missing account is 404; any backend-side failure is 503
//! - The multi-account endpoint never uses these; it is always 200

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::{AccountResult, CacheError, GatewayError, ResultStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        )
    }

    /// Error response for a failed single-account row, `None` if the row carries data.
    pub fn from_row(row: &AccountResult) -> Option<Self> {
        let status = match row.status {
            ResultStatus::Ok | ResultStatus::Partial => return None,
            ResultStatus::NotFound => StatusCode::NOT_FOUND,
            ResultStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        };
        let (code, message) = match &row.error {
            Some(detail) => (
                detail.code.clone(),
                detail.message.clone().unwrap_or_default(),
            ),
            None => ("unavailable".to_string(), String::new()),
        };
        Some(Self::new(status, code, message))
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Validation(message) => Self::bad_request(message),
            other => {
                tracing::error!(error = %other, "Internal gateway error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", other.to_string())
            }
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "cache_unavailable", err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        });
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdapterError, ErrorDetail};

    #[test]
    fn rows_map_to_http_statuses() {
        let missing = AccountResult::failed("BNK-1", &AdapterError::NotFound("BNK-1".into()), 3);
        assert_eq!(ApiError::from_row(&missing).unwrap().status, StatusCode::NOT_FOUND);

        let open = AccountResult::failed("BNK-1", &AdapterError::CircuitOpen("bank".into()), 0);
        let exhausted = AccountResult::failed(
            "BNK-1",
            &AdapterError::RetriesExhausted {
                attempts: 3,
                last: Box::new(AdapterError::Unavailable("503".into())),
            },
            0,
        );
        let open = ApiError::from_row(&open).unwrap();
        let exhausted = ApiError::from_row(&exhausted).unwrap();
        assert_eq!(open.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(open.code, "unavailable");
        assert_eq!((open.status, open.code, open.message), (exhausted.status, exhausted.code, exhausted.message));

        let unknown = AccountResult::rejected(
            "ZZ-1",
            ResultStatus::NotFound,
            ErrorDetail::new("unknown_backend", "no backend"),
            0,
        );
        assert_eq!(ApiError::from_row(&unknown).unwrap().code, "unknown_backend");
    }

    #[test]
    fn validation_is_bad_request() {
        let err = ApiError::from(GatewayError::Validation("bad id".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_request");
    }
}
