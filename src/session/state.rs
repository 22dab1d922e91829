use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;

use super::loader::Snapshot;
use super::reconciler::{compute_metrics, profit_series, DashboardMetrics, ProfitPoint};
use crate::ingestion::StateChange;
use crate::models::{Contract, Transaction};

pub const DEFAULT_CONTRACT_WINDOW: usize = 10;
pub const DEFAULT_MAX_TRANSACTIONS: usize = 5_000;

/// Bounds on the retained collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateLimits {
    pub contract_window: usize,
    pub max_transactions: usize,
}

impl Default for StateLimits {
    fn default() -> Self {
        Self {
            contract_window: DEFAULT_CONTRACT_WINDOW,
            max_transactions: DEFAULT_MAX_TRANSACTIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// Read-only copy of the session state handed to renderers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DashboardView {
    pub contracts: Vec<Contract>,
    pub transactions: Vec<Transaction>,
    pub metrics: DashboardMetrics,
    pub balance: Decimal,
    pub status: ChannelStatus,
    pub profit_series: Vec<ProfitPoint>,
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

/// Session-scoped state container. Both collections are kept
/// most-recent-first and the metrics are rebuilt after every mutation.
#[derive(Debug, Clone)]
pub struct DashboardState {
    contracts: VecDeque<Contract>,
    transactions: VecDeque<Transaction>,
    balance: Decimal,
    metrics: DashboardMetrics,
    status: ChannelStatus,
    last_snapshot_at: Option<DateTime<Utc>>,
    limits: StateLimits,
}

impl DashboardState {
    pub fn new(limits: StateLimits) -> Self {
        Self {
            contracts: VecDeque::new(),
            transactions: VecDeque::new(),
            balance: Decimal::ZERO,
            metrics: DashboardMetrics::default(),
            status: ChannelStatus::default(),
            last_snapshot_at: None,
            limits,
        }
    }

    pub fn contracts(&self) -> &VecDeque<Contract> {
        &self.contracts
    }

    pub fn transactions(&self) -> &VecDeque<Transaction> {
        &self.transactions
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.metrics
    }

    pub fn status(&self) -> ChannelStatus {
        self.status
    }

    /// Replace contracts, transactions and balance wholesale.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        let Snapshot {
            mut contracts,
            mut transactions,
            balance,
        } = snapshot;

        // Stable sorts keep the backend's order for equal timestamps.
        contracts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        contracts.truncate(self.limits.contract_window);
        transactions.truncate(self.limits.max_transactions);

        self.contracts = contracts.into();
        self.transactions = transactions.into();
        self.balance = balance;
        self.last_snapshot_at = Some(Utc::now());
        self.recompute();
    }

    pub fn add_contract(&mut self, contract: Contract) {
        self.contracts.push_front(contract);
        self.contracts.truncate(self.limits.contract_window);
        self.recompute();
    }

    /// Oldest transactions are evicted once the bound is reached.
    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push_front(transaction);
        self.transactions.truncate(self.limits.max_transactions);
        self.recompute();
    }

    /// Apply a normalized event. Returns false for changes with no state
    /// effect (log lines).
    pub fn apply(&mut self, change: StateChange) -> bool {
        match change {
            StateChange::AddContract(c) => self.add_contract(c),
            StateChange::AddTransaction(tx) => self.add_transaction(tx),
            StateChange::Log(_) => return false,
        }
        true
    }

    pub fn set_status(&mut self, status: ChannelStatus) {
        self.status = status;
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            contracts: self.contracts.iter().cloned().collect(),
            transactions: self.transactions.iter().cloned().collect(),
            metrics: self.metrics.clone(),
            balance: self.balance,
            status: self.status,
            profit_series: profit_series(&self.transactions),
            last_snapshot_at: self.last_snapshot_at,
        }
    }

    fn recompute(&mut self) {
        self.metrics = compute_metrics(&self.contracts, &self.transactions);
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(StateLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TxKind, TxStatus};
    use chrono::Duration;

    fn contract(address: &str, age_mins: i64) -> Contract {
        Contract {
            id: None,
            address: address.into(),
            group: "alpha".into(),
            status: None,
            timestamp: Utc::now() - Duration::minutes(age_mins),
        }
    }

    fn buy(token: &str, usd: i64) -> Transaction {
        Transaction {
            id: None,
            token_address: token.into(),
            kind: TxKind::Buy,
            dollar_amount: Decimal::from(usd),
            native_amount: Decimal::ZERO,
            status: TxStatus::Success,
            error: None,
            slippage: None,
            wallet_balance_after: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_contract_window_keeps_most_recent_first() {
        let mut state = DashboardState::default();
        for i in 0..11 {
            state.add_contract(contract(&format!("C{i}"), 0));
        }

        assert_eq!(state.contracts().len(), 10);
        assert_eq!(state.contracts()[0].address, "C10");
        assert_eq!(state.contracts()[9].address, "C1");
        assert_eq!(state.metrics().total_contracts, 10);
    }

    #[test]
    fn test_transaction_bound_evicts_oldest() {
        let mut state = DashboardState::new(StateLimits {
            contract_window: 10,
            max_transactions: 3,
        });
        for i in 0..5 {
            state.add_transaction(buy(&format!("T{i}"), 1));
        }

        let tokens: Vec<&str> = state
            .transactions()
            .iter()
            .map(|t| t.token_address.as_str())
            .collect();
        assert_eq!(tokens, vec!["T4", "T3", "T2"]);
        assert_eq!(state.metrics().successful_buys, 3);
    }

    #[test]
    fn test_snapshot_replaces_instead_of_merging() {
        let mut state = DashboardState::default();
        state.add_transaction(buy("EVENT_ONLY", 3));

        state.apply_snapshot(Snapshot {
            contracts: vec![contract("Old", 10), contract("New", 1)],
            transactions: vec![buy("A", 10)],
            balance: Decimal::new(15, 1),
        });

        assert_eq!(state.transactions().len(), 1);
        assert_eq!(state.transactions()[0].token_address, "A");
        assert_eq!(state.contracts()[0].address, "New");
        assert_eq!(state.balance(), Decimal::new(15, 1));
        assert_eq!(state.metrics().profit, Decimal::from(-10));
        assert!(state.view().last_snapshot_at.is_some());
    }

    #[test]
    fn test_log_changes_leave_state_untouched() {
        let mut state = DashboardState::default();
        let before = state.view();
        assert!(!state.apply(StateChange::Log("hello".into())));
        assert_eq!(state.view(), before);
    }
}
