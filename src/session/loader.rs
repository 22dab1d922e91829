use metrics::{counter, histogram};
use rust_decimal::Decimal;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::backend::{BackendError, SnapshotSource};
use crate::models::{Contract, Transaction};

/// Full backend state as of one load.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub contracts: Vec<Contract>,
    pub transactions: Vec<Transaction>,
    pub balance: Decimal,
}

#[derive(Debug, Error)]
#[error("{read} read failed: {source}")]
pub struct SnapshotError {
    pub read: &'static str,
    pub source: BackendError,
}

/// Issue the contracts, transactions and balance reads concurrently.
///
/// Succeeds only when all three succeed: the first failing (or timed-out)
/// read fails the whole load, so callers never see a partial snapshot.
pub async fn load_snapshot<S>(source: &S, timeout: Duration) -> Result<Snapshot, SnapshotError>
where
    S: SnapshotSource + ?Sized,
{
    let start = Instant::now();

    let result = tokio::try_join!(
        bounded("contracts", timeout, source.fetch_contracts()),
        bounded("transactions", timeout, source.fetch_transactions()),
        bounded("balance", timeout, source.fetch_balance()),
    );

    histogram!("snapshot_latency_seconds").record(start.elapsed().as_secs_f64());
    counter!("snapshot_loads_total").increment(1);

    match result {
        Ok((contracts, transactions, balance)) => {
            tracing::debug!(
                contracts = contracts.len(),
                transactions = transactions.len(),
                balance = %balance,
                "Snapshot loaded"
            );
            Ok(Snapshot {
                contracts,
                transactions,
                balance,
            })
        }
        Err(e) => {
            counter!("snapshot_failures_total").increment(1);
            Err(e)
        }
    }
}

async fn bounded<T>(
    read: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T, BackendError>>,
) -> Result<T, SnapshotError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(SnapshotError { read, source }),
        Err(_) => Err(SnapshotError {
            read,
            source: BackendError::Timeout { read },
        }),
    }
}
