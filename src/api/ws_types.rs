use serde::Serialize;

use crate::services::notifier::Notification;
use crate::session::DashboardView;

/// Messages broadcast to all connected dashboard WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "state")]
    State(Box<DashboardView>),

    #[serde(rename = "notification")]
    Notification(Notification),

    #[serde(rename = "log")]
    Log(LogLine),
}

#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub message: String,
}
