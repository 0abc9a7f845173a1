//! End-to-end tests for the account API against simulated backends.

use gateway_sdk::{GatewayClient, SimulationRequest};
use reqwest::StatusCode;

mod common;

#[test_log::test(tokio::test)]
async fn single_account_is_normalized() {
    let gw = common::start_gateway(|_| {}).await;

    let loan = gw.client.get_account("LN-3001", false).await.unwrap();
    assert_eq!(loan.account_type, "loan");
    assert_eq!(loan.status, "active");
    assert_eq!(loan.backend_source, "loan-adapter/v1");
    assert_eq!(loan.balances[0].available, 0.0);
    assert_eq!(loan.balances[0].ledger, Some(-182500.0));
    assert!(!loan.stale);

    let card = gw.client.get_account("CC-2001", false).await.unwrap();
    assert_eq!(card.account_type, "creditcard");
    assert_eq!(card.owner.name.as_deref(), Some("Grace Hopper"));
}

#[test_log::test(tokio::test)]
async fn single_account_error_statuses() {
    let gw = common::start_gateway(|_| {}).await;

    let missing = gw.client.get_account("BNK-0000", false).await.unwrap_err();
    assert_eq!(missing.api(), Some((StatusCode::NOT_FOUND, "not_found")));

    let unowned = gw.client.get_account("ZZZ-1", false).await.unwrap_err();
    assert_eq!(unowned.api(), Some((StatusCode::NOT_FOUND, "unknown_backend")));

    let malformed = gw.client.get_account("BNK.1%20x", false).await.unwrap_err();
    assert_eq!(malformed.api(), Some((StatusCode::BAD_REQUEST, "invalid_request")));

    let contract = gw.client.get_account("LEG-5999", false).await.unwrap_err();
    assert_eq!(contract.api(), Some((StatusCode::SERVICE_UNAVAILABLE, "unavailable")));
}

#[test_log::test(tokio::test)]
async fn multi_account_reports_partial_in_request_order() {
    let gw = common::start_gateway(|_| {}).await;
    gw.client
        .simulate("loan", &SimulationRequest::mode("error"))
        .await
        .unwrap();

    let response = gw
        .client
        .get_accounts(&["BNK-1001", "LN-3001", "CRY-6001"], false)
        .await
        .unwrap();

    assert_eq!(response.overall_status, "partial");
    let ids: Vec<_> = response.results.iter().map(|r| r.account_id.as_str()).collect();
    assert_eq!(ids, ["BNK-1001", "LN-3001", "CRY-6001"]);
    assert_eq!(response.results[0].status, "ok");
    assert_eq!(response.results[1].status, "unavailable");
    assert_eq!(response.results[2].status, "ok");
    assert!(response.results[1].data.is_none());
    assert!(!response.request_id.is_empty());
}

#[test_log::test(tokio::test)]
async fn multi_account_validation() {
    let gw = common::start_gateway(|config| config.aggregator.max_ids = 2).await;

    let too_many = gw
        .client
        .get_accounts(&["BNK-1001", "CC-2001", "LN-3001"], false)
        .await
        .unwrap_err();
    assert_eq!(too_many.api(), Some((StatusCode::BAD_REQUEST, "invalid_request")));

    let empty = gw.client.get_accounts(&[], false).await.unwrap_err();
    assert_eq!(empty.api(), Some((StatusCode::BAD_REQUEST, "invalid_request")));

    let all_missing = gw
        .client
        .get_accounts(&["BNK-0000", "ZZZ-1"], false)
        .await
        .unwrap();
    assert_eq!(all_missing.overall_status, "error");
}

#[test_log::test(tokio::test)]
async fn stale_entry_served_while_backend_is_down() {
    let gw = common::start_gateway(|config| {
        config.cache.ttl_secs = 0;
        config.cache.max_stale_secs = 3600;
    })
    .await;

    let fresh = gw.client.get_account("INV-4001", false).await.unwrap();
    assert!(!fresh.stale);

    gw.client
        .simulate("investment", &SimulationRequest::mode("error"))
        .await
        .unwrap();

    let stale = gw.client.get_account("INV-4001", false).await.unwrap();
    assert!(stale.stale);
    assert_eq!(stale.display_name, "Retirement");

    let multi = gw.client.get_accounts(&["INV-4001"], false).await.unwrap();
    assert_eq!(multi.results[0].status, "partial");
    assert_eq!(multi.overall_status, "partial");
}

#[test_log::test(tokio::test)]
async fn invalidation_forces_a_fresh_fetch() {
    let gw = common::start_gateway(|_| {}).await;

    let ack = gw.client.invalidate("BNK-4040").await.unwrap();
    assert_eq!(ack.removed, 0);

    gw.client.get_account("BNK-1001", false).await.unwrap();
    let ack = gw.client.invalidate("BNK-1001").await.unwrap();
    assert_eq!(ack.removed, 1);

    gw.client
        .simulate("bank", &SimulationRequest::mode("error"))
        .await
        .unwrap();
    let err = gw.client.get_account("BNK-1001", false).await.unwrap_err();
    assert_eq!(err.api().map(|(s, _)| s), Some(StatusCode::SERVICE_UNAVAILABLE));

    gw.client
        .simulate("bank", &SimulationRequest::mode("healthy"))
        .await
        .unwrap();
    let refetched = gw.client.get_account("BNK-1001", false).await.unwrap();
    assert!(!refetched.stale);

    gw.client.get_account("CC-2001", false).await.unwrap();
    assert!(gw.client.invalidate_all().await.unwrap().removed >= 2);
}

#[test_log::test(tokio::test)]
async fn health_reports_degraded_backends() {
    let gw = common::start_gateway(|_| {}).await;

    let report = gw.client.health().await.unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.backends.len(), 6);
    assert!(report.backends.iter().all(|b| b.healthy));

    gw.client
        .simulate("crypto", &SimulationRequest::mode("error"))
        .await
        .unwrap();

    // Simulation is visible to health checks before any traffic trips the breaker.
    let report = gw.client.health().await.unwrap();
    assert_eq!(report.status, "degraded");
    let crypto = report.backend("crypto").unwrap();
    assert!(!crypto.healthy);
    assert_eq!(crypto.circuit["state"], "closed");
    assert!(report.backend("bank").unwrap().healthy);

    for _ in 0..3 {
        let _ = gw.client.get_account("CRY-6001", true).await;
    }

    let report = gw.client.health().await.unwrap();
    assert_eq!(report.status, "degraded");
    let crypto = report.backend("crypto").unwrap();
    assert_eq!(crypto.circuit["state"], "open");
    assert_eq!(crypto.simulation["mode"], "error");
}

#[test_log::test(tokio::test)]
async fn admin_routes_require_configured_key() {
    let gw = common::start_gateway(|config| config.admin.api_key = Some("s3cret".into())).await;

    let denied = gw.client.invalidate_all().await.unwrap_err();
    assert_eq!(denied.api(), Some((StatusCode::UNAUTHORIZED, "unauthorized")));

    let admin = GatewayClient::new(&gw.url()).with_admin_key("s3cret");
    assert!(admin.invalidate_all().await.is_ok());

    // Account API stays open.
    assert!(gw.client.get_account("BNK-1001", false).await.is_ok());
}

#[test_log::test(tokio::test)]
async fn unknown_simulation_target_and_mode() {
    let gw = common::start_gateway(|_| {}).await;

    let unknown = gw
        .client
        .simulate("mainframe", &SimulationRequest::mode("error"))
        .await
        .unwrap_err();
    assert_eq!(unknown.api(), Some((StatusCode::NOT_FOUND, "unknown_backend")));

    let bad_mode = gw
        .client
        .simulate("bank", &SimulationRequest::mode("melting"))
        .await
        .unwrap_err();
    assert_eq!(bad_mode.api().map(|(s, _)| s), Some(StatusCode::BAD_REQUEST));
}

#[test_log::test(tokio::test)]
async fn metrics_endpoint_exposes_gateway_series() {
    let gw = common::start_gateway(|_| {}).await;
    gw.client.get_account("BNK-1001", false).await.unwrap();
    gw.client.get_account("BNK-1001", false).await.unwrap();

    let text = gw.client.metrics().await.unwrap();
    assert!(text.contains("gateway_requests_total"));
    assert!(text.contains("gateway_adapter_calls_total"));
    assert!(text.contains("gateway_cache_hits_total"));
    assert!(text.contains("gateway_circuit_breaker_state"));
}

#[test_log::test(tokio::test)]
async fn request_id_is_echoed() {
    let gw = common::start_gateway(|_| {}).await;
    let res = reqwest::Client::new()
        .get(format!("{}/v1/accounts/BNK-1001", gw.url()))
        .header("x-request-id", "req-abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["x-request-id"], "req-abc");
}
