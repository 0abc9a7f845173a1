//! Request context extraction.
//!
//! # Responsibilities
//! - Expose the request ID assigned by the request-id layer
//! - Carry an optional caller-supplied trace ID
//! - Interpret the `noCache` query flag
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing (outermost layer)
//! - An inbound `x-request-id` is preserved, otherwise a UUID v4 is generated

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::convert::Infallible;

use crate::cache::CacheMode;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_TRACE_ID: &str = "x-trace-id";

/// Per-request identifiers pulled from headers.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub trace_id: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            request_id: header(X_REQUEST_ID).unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            trace_id: header(X_TRACE_ID),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// `noCache` present with any value except `false`/`0` forces a refresh.
pub fn cache_mode(no_cache: Option<&str>) -> CacheMode {
    match no_cache.map(|v| v.trim().to_ascii_lowercase()) {
        None => CacheMode::Use,
        Some(v) if v == "false" || v == "0" => CacheMode::Use,
        Some(_) => CacheMode::Refresh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn no_cache_flag_semantics() {
        assert_eq!(cache_mode(None), CacheMode::Use);
        assert_eq!(cache_mode(Some("")), CacheMode::Refresh);
        assert_eq!(cache_mode(Some("true")), CacheMode::Refresh);
        assert_eq!(cache_mode(Some("1")), CacheMode::Refresh);
        assert_eq!(cache_mode(Some("FALSE")), CacheMode::Use);
        assert_eq!(cache_mode(Some("0")), CacheMode::Use);
    }

    #[test]
    fn context_prefers_inbound_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-42"));
        headers.insert(X_TRACE_ID, HeaderValue::from_static("trace-7"));
        let ctx = RequestContext::from_headers(&headers);
        assert_eq!(ctx.request_id, "req-42");
        assert_eq!(ctx.trace_id.as_deref(), Some("trace-7"));

        let generated = RequestContext::from_headers(&HeaderMap::new());
        assert!(uuid::Uuid::parse_str(&generated.request_id).is_ok());
        assert!(generated.trace_id.is_none());
    }
}
