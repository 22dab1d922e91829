use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Contract, Transaction};
use crate::session::{ChannelStatus, DashboardMetrics, DashboardView};
use crate::AppState;

#[derive(Serialize)]
pub struct DashboardSummary {
    pub metrics: DashboardMetrics,
    pub successful_trades: usize,
    pub balance: Decimal,
    pub status: ChannelStatus,
}

/// GET /api/dashboard: the full reconciled view.
pub async fn view(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.publisher.latest())
}

/// GET /api/dashboard/summary: metric tiles only.
pub async fn summary(State(state): State<AppState>) -> Json<DashboardSummary> {
    let view = state.publisher.latest();
    Json(DashboardSummary {
        successful_trades: view.metrics.successful_trades(),
        metrics: view.metrics,
        balance: view.balance,
        status: view.status,
    })
}

pub async fn contracts(State(state): State<AppState>) -> Json<Vec<Contract>> {
    Json(state.publisher.latest().contracts)
}

pub async fn transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.publisher.latest().transactions)
}
