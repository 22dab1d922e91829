use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Contract, Transaction, TxKind};

/// Summary figures shown on the dashboard tiles.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DashboardMetrics {
    pub total_contracts: usize,
    pub successful_buys: usize,
    pub successful_sells: usize,
    /// Successful sell dollars minus successful buy dollars.
    pub profit: Decimal,
    /// Distinct tokens with at least one successful buy.
    pub active_contracts: usize,
}

impl DashboardMetrics {
    pub fn successful_trades(&self) -> usize {
        self.successful_buys + self.successful_sells
    }
}

/// Derive the dashboard metrics from the current collections.
///
/// Always recomputed wholesale, never patched, so the figures cannot drift
/// from the collections they summarize. Failed and pending transactions
/// count toward nothing.
pub fn compute_metrics<'a>(
    contracts: impl IntoIterator<Item = &'a Contract>,
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> DashboardMetrics {
    let mut metrics = DashboardMetrics {
        total_contracts: contracts.into_iter().count(),
        ..Default::default()
    };

    let mut bought: HashSet<&str> = HashSet::new();
    let mut bought_usd = Decimal::ZERO;
    let mut sold_usd = Decimal::ZERO;

    for tx in transactions {
        if tx.is_successful(TxKind::Buy) {
            metrics.successful_buys += 1;
            bought_usd += tx.dollar_amount;
            bought.insert(tx.token_address.as_str());
        } else if tx.is_successful(TxKind::Sell) {
            metrics.successful_sells += 1;
            sold_usd += tx.dollar_amount;
        }
    }

    metrics.profit = sold_usd - bought_usd;
    metrics.active_contracts = bought.len();
    metrics
}

/// One point of the profit chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

/// Chart feed: one point per successful trade, oldest first. Sells add
/// their dollar amount, buys subtract it.
pub fn profit_series<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Vec<ProfitPoint> {
    let mut points: Vec<ProfitPoint> = transactions
        .into_iter()
        .filter_map(|tx| {
            let value = if tx.is_successful(TxKind::Sell) {
                tx.dollar_amount
            } else if tx.is_successful(TxKind::Buy) {
                -tx.dollar_amount
            } else {
                return None;
            };
            Some(ProfitPoint {
                timestamp: tx.timestamp,
                value,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
