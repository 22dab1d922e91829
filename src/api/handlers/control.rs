use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::errors::AppError;
use crate::AppState;

/// POST /api/control/refresh: Load a fresh snapshot from the backend.
pub async fn refresh(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.session.refresh().await?;
    tracing::info!("Snapshot refresh requested via control API");
    Ok(Json(json!({ "status": "refresh_requested" })))
}

/// POST /api/control/reconnect: Re-establish the live channel.
pub async fn reconnect(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.session.reconnect().await?;
    tracing::info!("Live channel reconnect requested via control API");
    Ok(Json(json!({ "status": "reconnect_requested" })))
}
