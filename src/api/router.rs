use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics));

    let api = Router::new()
        // Dashboard
        .route("/api/dashboard", get(handlers::dashboard::view))
        .route("/api/dashboard/summary", get(handlers::dashboard::summary))
        .route("/api/contracts", get(handlers::dashboard::contracts))
        .route("/api/transactions", get(handlers::dashboard::transactions))
        // Control
        .route("/api/control/refresh", post(handlers::control::refresh))
        .route("/api/control/reconnect", post(handlers::control::reconnect))
        // WebSocket
        .route("/ws", get(handlers::ws::handler));

    // Browser dashboards are served from other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
