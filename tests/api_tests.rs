mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use tower::ServiceExt;

use xcute_dashboard::api::router::create_router;
use xcute_dashboard::config::AppConfig;
use xcute_dashboard::models::{TxKind, TxStatus};
use xcute_dashboard::session::ChannelStatus;
use xcute_dashboard::AppState;

use common::{contract, harness, transaction, wait_for_view, Harness};

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        backend_url: "http://localhost:8000".into(),
        live_channel_url: "ws://localhost:8000/ws".into(),
        reconcile_on_event: true,
        snapshot_timeout_secs: 2,
        contract_window: 10,
        max_transactions: 5_000,
        telegram_bot_token: None,
        telegram_chat_id: None,
        notifications_enabled: false,
    }
}

/// Activated session primed with two contracts, a profitable round trip
/// and one failed buy.
async fn build_test_app() -> (axum::Router, Harness) {
    let mut h = harness(true);
    *h.source.contracts.lock().unwrap() = vec![contract("Alpha", 2), contract("Beta", 1)];
    *h.source.transactions.lock().unwrap() = vec![
        transaction("Alpha", TxKind::Buy, TxStatus::Success, 20),
        transaction("Alpha", TxKind::Sell, TxStatus::Success, 26),
        transaction("Beta", TxKind::Buy, TxStatus::Failed, 1),
    ];
    *h.source.balance.lock().unwrap() = Decimal::new(325, 2);
    let _live = h.connector.push_channel();

    let handle = h.session.activate().await;
    wait_for_view(&mut h.views, |v| {
        v.last_snapshot_at.is_some() && v.status == ChannelStatus::Connected
    })
    .await;

    let state = AppState {
        config: test_config(),
        publisher: h.publisher.clone(),
        session: handle,
        metrics_handle: PrometheusBuilder::new().build_recorder().handle(),
    };

    (create_router(state), h)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check() {
    let (app, mut h) = build_test_app().await;

    let (status, json) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["channel"], "connected");
    assert!(json["last_snapshot_at"].is_string());

    h.session.teardown().await;
}

#[tokio::test]
async fn test_dashboard_summary() {
    let (app, mut h) = build_test_app().await;

    let (status, json) = get_json(app, "/api/dashboard/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["metrics"]["total_contracts"], 2);
    assert_eq!(json["metrics"]["successful_buys"], 1);
    assert_eq!(json["metrics"]["successful_sells"], 1);
    assert_eq!(json["metrics"]["active_contracts"], 1);
    assert_eq!(json["successful_trades"], 2);
    assert_eq!(json["metrics"]["profit"].as_f64(), Some(6.0));
    assert_eq!(json["balance"].as_f64(), Some(3.25));

    h.session.teardown().await;
}

#[tokio::test]
async fn test_full_dashboard_view() {
    let (app, mut h) = build_test_app().await;

    let (status, json) = get_json(app, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "connected");
    assert_eq!(json["contracts"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["transactions"].as_array().map(Vec::len), Some(3));
    // Only successful trades feed the chart.
    assert_eq!(json["profit_series"].as_array().map(Vec::len), Some(2));

    h.session.teardown().await;
}

#[tokio::test]
async fn test_contracts_most_recent_first() {
    let (app, mut h) = build_test_app().await;

    let (status, json) = get_json(app, "/api/contracts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["address"], "Beta");
    assert_eq!(json[1]["address"], "Alpha");

    h.session.teardown().await;
}

#[tokio::test]
async fn test_transactions_wire_format() {
    let (app, mut h) = build_test_app().await;

    let (status, json) = get_json(app, "/api/transactions").await;
    assert_eq!(status, StatusCode::OK);
    let failed = json
        .as_array()
        .unwrap()
        .iter()
        .find(|tx| tx["status"] == "failed")
        .expect("failed buy is listed");
    assert_eq!(failed["token_address"], "Beta");
    assert_eq!(failed["transaction_type"], "buy");

    h.session.teardown().await;
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, mut h) = build_test_app().await;

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    h.session.teardown().await;
}

#[tokio::test]
async fn test_control_refresh() {
    let (app, mut h) = build_test_app().await;
    let loads_before = h.source.loads();

    let (status, json) = post_json(app, "/api/control/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "refresh_requested");

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(h.source.loads(), loads_before + 1);

    h.session.teardown().await;
}

#[tokio::test]
async fn test_control_unavailable_after_teardown() {
    let (app, mut h) = build_test_app().await;
    h.session.teardown().await;

    let (status, json) = post_json(app, "/api/control/reconnect").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["success"], false);
}
