//! Account API handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::time::Instant;

use crate::aggregator::parse_id_list;
use crate::http::request::{cache_mode, RequestContext};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    #[serde(rename = "noCache")]
    pub no_cache: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountsQuery {
    pub ids: Option<String>,
    #[serde(rename = "noCache")]
    pub no_cache: Option<String>,
}

/// `GET /v1/accounts/{id}`
pub async fn get_account(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(account_id): Path<String>,
    Query(query): Query<AccountQuery>,
) -> Response {
    let start = Instant::now();
    let mode = cache_mode(query.no_cache.as_deref());

    let response = match state
        .aggregator
        .get_account(&account_id, mode, ctx.trace_id.as_deref())
        .await
    {
        Ok(row) => match ApiError::from_row(&row) {
            Some(err) => err.into_response(),
            None => match row.data {
                Some(summary) => Json(summary).into_response(),
                None => ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "unavailable", "no data")
                    .into_response(),
            },
        },
        Err(e) => ApiError::from(e).into_response(),
    };

    tracing::debug!(
        request_id = %ctx.request_id,
        account_id = %account_id,
        status = response.status().as_u16(),
        "Single account request"
    );
    metrics::record_request("account", response.status().as_u16(), start);
    response
}

/// `GET /v1/accounts?ids=a,b,c`
pub async fn get_accounts(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<AccountsQuery>,
) -> Response {
    let start = Instant::now();
    let mode = cache_mode(query.no_cache.as_deref());
    let ids = query.ids.as_deref().map(parse_id_list).unwrap_or_default();

    let response = match state
        .aggregator
        .get_accounts(&ids, mode, ctx.request_id.clone(), ctx.trace_id.as_deref())
        .await
    {
        Ok(body) => Json(body).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    };

    metrics::record_request("accounts", response.status().as_u16(), start);
    response
}

/// `GET /metrics`
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics_disabled",
            "metrics recorder is not installed",
        )
        .into_response(),
    }
}
