use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc, watch};

use xcute_dashboard::api::ws_types::WsMessage;
use xcute_dashboard::backend::{BackendError, SnapshotSource};
use xcute_dashboard::ingestion::{ChannelConnector, ChannelError};
use xcute_dashboard::models::{Contract, Transaction, TxKind, TxStatus};
use xcute_dashboard::services::ViewPublisher;
use xcute_dashboard::session::{DashboardSession, DashboardView, SessionConfig};

pub const WAIT: Duration = Duration::from_secs(3);

pub type TestSession = DashboardSession<FakeSource, FakeConnector>;

/// Scripted backend: serves whatever the test put in, optionally slowly,
/// optionally failing the balance read.
#[derive(Default)]
pub struct FakeSource {
    pub contracts: Mutex<Vec<Contract>>,
    pub transactions: Mutex<Vec<Transaction>>,
    pub balance: Mutex<Decimal>,
    pub delay: Mutex<Duration>,
    pub fail_balance: AtomicBool,
    /// Number of snapshot loads started (counted on the balance read).
    pub loads: AtomicUsize,
}

impl FakeSource {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SnapshotSource for FakeSource {
    async fn fetch_contracts(&self) -> Result<Vec<Contract>, BackendError> {
        self.pause().await;
        Ok(self.contracts.lock().unwrap().clone())
    }

    async fn fetch_transactions(&self) -> Result<Vec<Transaction>, BackendError> {
        self.pause().await;
        Ok(self.transactions.lock().unwrap().clone())
    }

    async fn fetch_balance(&self) -> Result<Decimal, BackendError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(BackendError::Unexpected("wallet balance: rpc unavailable".into()));
        }
        Ok(*self.balance.lock().unwrap())
    }
}

/// Hands out pre-scripted mpsc channels, one per connect.
#[derive(Default)]
pub struct FakeConnector {
    channels: Mutex<VecDeque<mpsc::Receiver<String>>>,
    pub connects: AtomicUsize,
}

impl FakeConnector {
    /// Script the next channel and return its sending side.
    pub fn push_channel(&self) -> mpsc::Sender<String> {
        let (tx, rx) = mpsc::channel(64);
        self.channels.lock().unwrap().push_back(rx);
        tx
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelConnector for FakeConnector {
    type Channel = mpsc::Receiver<String>;

    async fn connect(&self) -> Result<Self::Channel, ChannelError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.channels
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChannelError::Connect("no channel scripted".into()))
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub connector: Arc<FakeConnector>,
    pub publisher: ViewPublisher,
    pub session: TestSession,
    pub views: watch::Receiver<DashboardView>,
    pub messages: broadcast::Receiver<WsMessage>,
}

pub fn harness(reconcile_on_event: bool) -> Harness {
    let source = Arc::new(FakeSource::default());
    let connector = Arc::new(FakeConnector::default());
    let (ws_tx, _) = broadcast::channel::<WsMessage>(1024);
    let publisher = ViewPublisher::new(ws_tx, None);
    let views = publisher.subscribe_view();
    let messages = publisher.subscribe_ws();

    let config = SessionConfig {
        reconcile_on_event,
        snapshot_timeout: Duration::from_secs(2),
        ..SessionConfig::default()
    };
    let session = DashboardSession::new(source.clone(), connector.clone(), publisher.clone(), config);

    Harness {
        source,
        connector,
        publisher,
        session,
        views,
        messages,
    }
}

/// Wait until the latest published view satisfies `pred`.
#[allow(dead_code)]
pub async fn wait_for_view(
    views: &mut watch::Receiver<DashboardView>,
    pred: impl Fn(&DashboardView) -> bool,
) -> DashboardView {
    tokio::time::timeout(WAIT, async {
        loop {
            {
                let view = views.borrow_and_update();
                if pred(&view) {
                    return view.clone();
                }
            }
            views.changed().await.expect("publisher dropped");
        }
    })
    .await
    .expect("timed out waiting for dashboard view")
}

/// Read broadcast messages in order until one satisfies `pred`.
#[allow(dead_code)]
pub async fn wait_for_message(
    messages: &mut broadcast::Receiver<WsMessage>,
    pred: impl Fn(&WsMessage) -> bool,
) -> WsMessage {
    tokio::time::timeout(WAIT, async {
        loop {
            let msg = messages.recv().await.expect("broadcast closed");
            if pred(&msg) {
                return msg;
            }
        }
    })
    .await
    .expect("timed out waiting for broadcast message")
}

#[allow(dead_code)]
pub fn contract(address: &str, age_mins: i64) -> Contract {
    Contract {
        id: None,
        address: address.into(),
        group: "alpha_calls".into(),
        status: Some("found".into()),
        timestamp: Utc::now() - chrono::Duration::minutes(age_mins),
    }
}

#[allow(dead_code)]
pub fn transaction(token: &str, kind: TxKind, status: TxStatus, usd: i64) -> Transaction {
    Transaction {
        id: None,
        token_address: token.into(),
        kind,
        dollar_amount: Decimal::from(usd),
        native_amount: Decimal::ZERO,
        status,
        error: None,
        slippage: None,
        wallet_balance_after: None,
        timestamp: Utc::now(),
    }
}
