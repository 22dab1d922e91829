use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{ApiBalance, ApiContract, ApiTransaction};
use super::SnapshotSource;
use crate::models::{Contract, Transaction};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{read} read timed out")]
    Timeout { read: &'static str },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// REST client for the trading backend's read-only endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch detected contracts, newest first.
    pub async fn get_contracts(&self) -> Result<Vec<ApiContract>, BackendError> {
        let url = format!("{}/api/contracts", self.base_url);
        let resp = self.http.get(&url).send().await?.error_for_status()?;

        let contracts: Vec<ApiContract> = resp.json().await?;
        Ok(contracts)
    }

    /// Fetch all recorded transactions, newest first.
    pub async fn get_transactions(&self) -> Result<Vec<ApiTransaction>, BackendError> {
        let url = format!("{}/api/transactions", self.base_url);
        let resp = self.http.get(&url).send().await?.error_for_status()?;

        let transactions: Vec<ApiTransaction> = resp.json().await?;
        Ok(transactions)
    }

    /// Fetch the wallet balance in native units.
    pub async fn get_wallet_balance(&self) -> Result<ApiBalance, BackendError> {
        let url = format!("{}/api/wallet_balance", self.base_url);
        let resp = self.http.get(&url).send().await?.error_for_status()?;

        let balance: ApiBalance = resp.json().await?;
        Ok(balance)
    }
}

#[async_trait]
impl SnapshotSource for BackendClient {
    async fn fetch_contracts(&self) -> Result<Vec<Contract>, BackendError> {
        let rows = self.get_contracts().await?;
        let total = rows.len();
        let contracts: Vec<Contract> = rows.into_iter().filter_map(ApiContract::into_contract).collect();
        if contracts.len() < total {
            tracing::debug!(dropped = total - contracts.len(), "Skipped contract rows without an address");
        }
        Ok(contracts)
    }

    async fn fetch_transactions(&self) -> Result<Vec<Transaction>, BackendError> {
        let rows = self.get_transactions().await?;
        let total = rows.len();
        let transactions: Vec<Transaction> = rows
            .into_iter()
            .filter_map(ApiTransaction::into_transaction)
            .collect();
        if transactions.len() < total {
            tracing::debug!(
                dropped = total - transactions.len(),
                "Skipped malformed transaction rows"
            );
        }
        Ok(transactions)
    }

    async fn fetch_balance(&self) -> Result<Decimal, BackendError> {
        let body = self.get_wallet_balance().await?;
        match (body.balance, body.error) {
            (Some(balance), _) => Ok(balance),
            (None, Some(e)) => Err(BackendError::Unexpected(format!("wallet balance: {e}"))),
            (None, None) => Err(BackendError::Unexpected("wallet balance missing".into())),
        }
    }
}
