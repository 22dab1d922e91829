use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{TxKind, TxStatus};

/// Canonical trade record. Snapshot rows and live events are both
/// normalized into this shape before they enter session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub token_address: String,
    #[serde(rename = "transaction_type")]
    pub kind: TxKind,
    #[serde(rename = "amount_in_dollars")]
    pub dollar_amount: Decimal,
    #[serde(rename = "amount_in_sol")]
    pub native_amount: Decimal,
    pub status: TxStatus,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slippage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_balance_after: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn is_successful(&self, kind: TxKind) -> bool {
        self.kind == kind && self.status == TxStatus::Success
    }
}
