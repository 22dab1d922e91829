use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{resolve_timestamp, Contract, RawTimestamp, Transaction, TxKind, TxStatus};

// ---------------------------------------------------------------------------
// Contract (GET /api/contracts)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiContract {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub address: Option<String>,
    /// Older backends only send the address under `contract`.
    #[serde(default)]
    pub contract: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

impl ApiContract {
    /// Rows without any address are unusable and dropped.
    pub fn into_contract(self) -> Option<Contract> {
        let address = self.address.or(self.contract)?;
        Some(Contract {
            id: self.id,
            address,
            group: self.group.unwrap_or_else(|| "unknown".into()),
            status: self.status,
            timestamp: resolve_timestamp(self.timestamp.as_ref()),
        })
    }
}

// ---------------------------------------------------------------------------
// Transaction (GET /api/transactions)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTransaction {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub amount_in_dollars: Option<Decimal>,
    #[serde(default)]
    pub amount_in_sol: Option<Decimal>,
    #[serde(default)]
    pub slippage_tolerance: Option<Decimal>,
    #[serde(default)]
    pub wallet_balance_after: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<RawTimestamp>,
}

impl ApiTransaction {
    /// Rows without a token address or a recognizable kind are dropped.
    pub fn into_transaction(self) -> Option<Transaction> {
        let token_address = self.token_address?;
        let kind = TxKind::from_api_str(self.transaction_type.as_deref()?)?;
        Some(Transaction {
            id: self.id,
            token_address,
            kind,
            dollar_amount: self.amount_in_dollars.unwrap_or(Decimal::ZERO),
            native_amount: self.amount_in_sol.unwrap_or(Decimal::ZERO),
            status: TxStatus::from_api_str(self.status.as_deref()),
            error: self.error,
            slippage: self.slippage_tolerance,
            wallet_balance_after: self.wallet_balance_after,
            timestamp: resolve_timestamp(self.timestamp.as_ref()),
        })
    }
}

// ---------------------------------------------------------------------------
// Wallet balance (GET /api/wallet_balance)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ApiBalance {
    #[serde(default)]
    pub balance: Option<Decimal>,
    /// Set instead of `balance` when the backend's RPC lookup failed.
    #[serde(default)]
    pub error: Option<String>,
}
