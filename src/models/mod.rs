pub mod contract;
pub mod transaction;

pub use contract::Contract;
pub use transaction::Transaction;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TxKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Buy,
    Sell,
}

impl TxKind {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Some(TxKind::Buy),
            "sell" => Some(TxKind::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxKind::Buy => write!(f, "buy"),
            TxKind::Sell => write!(f, "sell"),
        }
    }
}

// ---------------------------------------------------------------------------
// TxStatus
// ---------------------------------------------------------------------------

/// Outcome of a trade attempt. Legacy payloads omit the status entirely;
/// those are successful trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[default]
    Success,
    Failed,
    Pending,
}

impl TxStatus {
    /// Maps a backend status label. Missing or empty labels mean success;
    /// unknown labels are kept out of the metrics by treating them as pending.
    pub fn from_api_str(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_lowercase()) {
            None => TxStatus::Success,
            Some(s) if s.is_empty() || s == "success" => TxStatus::Success,
            Some(s) if s == "failed" => TxStatus::Failed,
            Some(_) => TxStatus::Pending,
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Success => write!(f, "success"),
            TxStatus::Failed => write!(f, "failed"),
            TxStatus::Pending => write!(f, "pending"),
        }
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// A timestamp as the backend sends it: epoch seconds or a date string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(f64),
    Text(String),
}

impl RawTimestamp {
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::Epoch(secs) => DateTime::from_timestamp(*secs as i64, 0),
            RawTimestamp::Text(t) => parse_timestamp(t),
        }
    }
}

/// Resolve an optional raw timestamp, falling back to the receive time.
pub fn resolve_timestamp(raw: Option<&RawTimestamp>) -> DateTime<Utc> {
    raw.and_then(RawTimestamp::to_utc).unwrap_or_else(Utc::now)
}

/// Parse the timestamp formats the backend emits: epoch seconds, RFC 3339,
/// naive ISO-8601 (`isoformat()` output) and `YYYY-MM-DD HH:MM:SS`.
/// Naive values are taken as UTC.
pub fn parse_timestamp(t: &str) -> Option<DateTime<Utc>> {
    let t = t.trim();
    if let Ok(secs) = t.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(t, fmt).ok())
        .map(|naive| naive.and_utc())
}
