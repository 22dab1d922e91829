pub mod client;
pub mod types;

pub use client::{BackendClient, BackendError};
pub use types::{ApiBalance, ApiContract, ApiTransaction};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{Contract, Transaction};

/// The three request/response reads a snapshot is assembled from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch_contracts(&self) -> Result<Vec<Contract>, BackendError>;
    async fn fetch_transactions(&self) -> Result<Vec<Transaction>, BackendError>;
    async fn fetch_balance(&self) -> Result<Decimal, BackendError>;
}
