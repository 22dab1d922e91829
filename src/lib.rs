pub mod api;
pub mod backend;
pub mod config;
pub mod errors;
pub mod ingestion;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;

use crate::config::AppConfig;
use crate::services::ViewPublisher;
use crate::session::SessionHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub publisher: ViewPublisher,
    pub session: SessionHandle,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
