use chrono::{DateTime, Utc};
use serde::Serialize;

/// A tradable token announcement detected by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub address: String,
    /// Group or channel the announcement was seen in.
    pub group: String,
    /// Backend lifecycle label (`found`, `bought`, `sold`); absent on live events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub timestamp: DateTime<Utc>,
}
