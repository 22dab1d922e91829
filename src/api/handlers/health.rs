use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// The gateway stays healthy while the backend is unreachable; the live
/// channel status is reported alongside.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let view = state.publisher.latest();
    Json(json!({
        "status": "healthy",
        "backend": state.config.backend_url,
        "reconcile_on_event": state.config.reconcile_on_event,
        "channel": view.status,
        "last_snapshot_at": view.last_snapshot_at,
    }))
}

/// GET /metrics: Prometheus scrape payload.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics_handle.render(),
    )
}
