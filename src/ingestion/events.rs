use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::{resolve_timestamp, Contract, RawTimestamp, Transaction, TxKind, TxStatus};

/// Dollar amount recorded for a failed buy; the real spend is unknown.
pub const FAILED_BUY_PLACEHOLDER_USD: Decimal = Decimal::ONE;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no event name")]
    MissingKind,

    #[error("unknown event kind: {0}")]
    UnknownKind(String),
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContractPayload {
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

/// Shared shape of `buy` and `sell` payloads. Which token field is present
/// decides the trade kind.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradePayload {
    #[serde(default)]
    pub token_bought: Option<String>,
    #[serde(default)]
    pub token_sold: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub dollar_value: Option<Decimal>,
    #[serde(default)]
    pub amount_bought: Option<Decimal>,
    #[serde(default)]
    pub amount_sold: Option<Decimal>,
    #[serde(default)]
    pub slippage_paid: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuyFailedPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

// ---------------------------------------------------------------------------
// LiveEvent
// ---------------------------------------------------------------------------

/// One decoded message from the live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Contract(ContractPayload),
    Buy(TradePayload),
    Sell(TradePayload),
    BuyFailed(BuyFailedPayload),
    Log(String),
}

/// The single canonical state transition an event produces.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    AddContract(Contract),
    AddTransaction(Transaction),
    Log(String),
}

impl LiveEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LiveEvent::Contract(_) => "contract",
            LiveEvent::Buy(_) => "buy",
            LiveEvent::Sell(_) => "sell",
            LiveEvent::BuyFailed(_) => "buy_failed",
            LiveEvent::Log(_) => "log",
        }
    }

    fn from_parts(kind: &str, data: Value) -> Result<Self, FrameError> {
        let event = match kind {
            "contract" => LiveEvent::Contract(serde_json::from_value(data)?),
            "buy" => LiveEvent::Buy(serde_json::from_value(data)?),
            "sell" => LiveEvent::Sell(serde_json::from_value(data)?),
            "buy_failed" => LiveEvent::BuyFailed(serde_json::from_value(data)?),
            "log" => LiveEvent::Log(log_message(data)),
            other => return Err(FrameError::UnknownKind(other.to_string())),
        };
        Ok(event)
    }

    /// Fold the payload into one canonical state change. Returns `None`
    /// when the payload lacks the token or contract address it is about.
    pub fn normalize(self) -> Option<StateChange> {
        match self {
            LiveEvent::Contract(p) => {
                let address = p.address.or(p.contract)?;
                Some(StateChange::AddContract(Contract {
                    id: None,
                    address,
                    group: p.group.unwrap_or_else(|| "unknown".into()),
                    status: None,
                    timestamp: resolve_timestamp(p.timestamp.as_ref()),
                }))
            }
            LiveEvent::Buy(p) => normalize_trade(p, TxKind::Buy).map(StateChange::AddTransaction),
            LiveEvent::Sell(p) => normalize_trade(p, TxKind::Sell).map(StateChange::AddTransaction),
            LiveEvent::BuyFailed(p) => {
                let token_address = p.token?;
                Some(StateChange::AddTransaction(Transaction {
                    id: None,
                    token_address,
                    kind: TxKind::Buy,
                    dollar_amount: FAILED_BUY_PLACEHOLDER_USD,
                    native_amount: Decimal::ZERO,
                    status: TxStatus::Failed,
                    error: Some(p.error.unwrap_or_else(|| "unknown error".into())),
                    slippage: None,
                    wallet_balance_after: None,
                    timestamp: resolve_timestamp(p.timestamp.as_ref()),
                }))
            }
            LiveEvent::Log(message) => Some(StateChange::Log(message)),
        }
    }
}

fn normalize_trade(p: TradePayload, fallback: TxKind) -> Option<Transaction> {
    let (kind, token_address) = match (p.token_bought, p.token_sold) {
        (Some(token), _) => (TxKind::Buy, token),
        (None, Some(token)) => (TxKind::Sell, token),
        (None, None) => (fallback, p.token?),
    };

    let native_amount = match kind {
        TxKind::Buy => p.amount_bought,
        TxKind::Sell => p.amount_sold,
    }
    .unwrap_or(Decimal::ZERO);

    Some(Transaction {
        id: None,
        token_address,
        kind,
        dollar_amount: p.dollar_value.unwrap_or(Decimal::ZERO),
        native_amount,
        status: TxStatus::from_api_str(p.status.as_deref()),
        error: p.error,
        slippage: p.slippage_paid,
        wallet_balance_after: None,
        timestamp: resolve_timestamp(p.timestamp.as_ref()),
    })
}

fn log_message(data: Value) -> String {
    if let Some(s) = data.as_str() {
        return s.to_string();
    }
    match data.get("message").and_then(Value::as_str) {
        Some(s) => s.to_string(),
        None => data.to_string(),
    }
}

/// Decode a text frame. Two encodings are accepted:
/// - `{"event": "<kind>", "data": {...}}` (`type` is accepted for `event`)
/// - `["<kind>", {...}]`
pub fn parse_frame(text: &str) -> Result<LiveEvent, FrameError> {
    let value: Value = serde_json::from_str(text)?;

    let (kind, data) = match value {
        Value::Array(mut items) if !items.is_empty() => {
            let data = if items.len() > 1 { items.swap_remove(1) } else { Value::Null };
            match items.swap_remove(0) {
                Value::String(kind) => (kind, data),
                _ => return Err(FrameError::MissingKind),
            }
        }
        Value::Object(mut map) => {
            let kind = map
                .remove("event")
                .or_else(|| map.remove("type"))
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or(FrameError::MissingKind)?;
            (kind, map.remove("data").unwrap_or(Value::Null))
        }
        _ => return Err(FrameError::MissingKind),
    };

    // Payloads absent from the frame decode as all-defaults.
    let data = if data.is_null() && kind != "log" {
        Value::Object(Default::default())
    } else {
        data
    };

    LiveEvent::from_parts(&kind, data)
}
