use metrics::counter;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use super::loader::{load_snapshot, Snapshot, SnapshotError};
use super::state::{ChannelStatus, DashboardState, StateLimits};
use crate::backend::SnapshotSource;
use crate::ingestion::{parse_frame, ChannelConnector, ChannelError, FrameError, LiveChannel, StateChange};
use crate::services::notifier::{contract_notification, transaction_notification, Notification};
use crate::services::ViewPublisher;

pub const DEFAULT_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(10);
const CONTROL_BUFFER: usize = 16;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Re-fetch the full snapshot after every applied event. The event is
    /// applied first either way; the snapshot then replaces it wholesale.
    pub reconcile_on_event: bool,
    /// Upper bound on each of the three snapshot reads.
    pub snapshot_timeout: Duration,
    pub limits: StateLimits,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconcile_on_event: true,
            snapshot_timeout: DEFAULT_SNAPSHOT_TIMEOUT,
            limits: StateLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Load a fresh snapshot now.
    Refresh,
    /// Drop the live channel and establish a new one. State is kept.
    Reconnect,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("dashboard session is not active")]
    Inactive,
}

/// Cloneable control handle for a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<ControlCommand>,
}

impl SessionHandle {
    pub async fn send(&self, command: ControlCommand) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Inactive)
    }

    pub async fn refresh(&self) -> Result<(), SessionError> {
        self.send(ControlCommand::Refresh).await
    }

    pub async fn reconnect(&self) -> Result<(), SessionError> {
        self.send(ControlCommand::Reconnect).await
    }
}

struct ActiveSession {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<DashboardState>,
    handle: SessionHandle,
}

/// One dashboard view: owns the snapshot source, the live channel
/// connector and the state between activations.
///
/// While active, all state lives inside a single runner task; snapshot
/// results and channel frames are applied there one at a time, so a
/// snapshot replacement and an event append never interleave.
pub struct DashboardSession<S, C>
where
    S: SnapshotSource + 'static,
    C: ChannelConnector,
{
    source: Arc<S>,
    connector: Arc<C>,
    publisher: ViewPublisher,
    config: SessionConfig,
    parked: Option<DashboardState>,
    active: Option<ActiveSession>,
}

impl<S, C> DashboardSession<S, C>
where
    S: SnapshotSource + 'static,
    C: ChannelConnector,
{
    pub fn new(source: Arc<S>, connector: Arc<C>, publisher: ViewPublisher, config: SessionConfig) -> Self {
        let parked = Some(DashboardState::new(config.limits));
        Self {
            source,
            connector,
            publisher,
            config,
            parked,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// State held while the session is torn down.
    pub fn parked_state(&self) -> Option<&DashboardState> {
        self.parked.as_ref()
    }

    /// Start the runner: prime state from a snapshot and open a fresh live
    /// channel. A session that is already active is torn down first, so at
    /// most one channel exists per session.
    pub async fn activate(&mut self) -> SessionHandle {
        self.teardown().await;

        let state = self
            .parked
            .take()
            .unwrap_or_else(|| DashboardState::new(self.config.limits));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (control_tx, control_rx) = mpsc::channel(CONTROL_BUFFER);
        let handle = SessionHandle { tx: control_tx };

        let runner = Runner {
            source: self.source.clone(),
            connector: self.connector.clone(),
            publisher: self.publisher.clone(),
            config: self.config.clone(),
            state,
            fetches: JoinSet::new(),
            since_fetch: Vec::new(),
            refetch_pending: false,
            connected_once: false,
        };
        let task = tokio::spawn(runner.run(shutdown_rx, control_rx));

        tracing::info!(
            reconcile_on_event = self.config.reconcile_on_event,
            "Dashboard session activated"
        );

        self.active = Some(ActiveSession {
            shutdown: shutdown_tx,
            task,
            handle: handle.clone(),
        });
        handle
    }

    /// Stop the runner and close its channel. Once this returns, nothing
    /// mutates or publishes the session state until the next activation.
    pub async fn teardown(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        let _ = active.shutdown.send(());
        match active.task.await {
            Ok(state) => self.parked = Some(state),
            Err(e) => {
                tracing::error!(error = %e, "Dashboard runner ended abnormally, state discarded");
                self.parked = Some(DashboardState::new(self.config.limits));
            }
        }
        tracing::info!("Dashboard session torn down");
    }
}

type ConnectFuture<Ch> = Pin<Box<dyn Future<Output = Result<Ch, ChannelError>> + Send>>;

struct Runner<S, C: ChannelConnector> {
    source: Arc<S>,
    connector: Arc<C>,
    publisher: ViewPublisher,
    config: SessionConfig,
    state: DashboardState,
    fetches: JoinSet<Result<Snapshot, SnapshotError>>,
    /// Changes applied while a load was in flight. Its result predates
    /// them, so they are replayed on top of it.
    since_fetch: Vec<StateChange>,
    refetch_pending: bool,
    connected_once: bool,
}

impl<S, C> Runner<S, C>
where
    S: SnapshotSource + 'static,
    C: ChannelConnector,
{
    async fn run(
        mut self,
        mut shutdown: oneshot::Receiver<()>,
        mut control: mpsc::Receiver<ControlCommand>,
    ) -> DashboardState {
        self.state.set_status(ChannelStatus::Connecting);
        self.publish();
        self.request_snapshot("activation");

        let mut channel: Option<C::Channel> = None;
        let mut connecting: Option<ConnectFuture<C::Channel>> = Some(self.connect());

        loop {
            tokio::select! {
                biased;

                // Also fires when the session is dropped without teardown.
                _ = &mut shutdown => break,

                Some(command) = control.recv() => match command {
                    ControlCommand::Refresh => self.request_snapshot("manual"),
                    ControlCommand::Reconnect => {
                        tracing::info!("Reconnecting live channel");
                        channel = None;
                        connecting = Some(self.connect());
                        self.state.set_status(ChannelStatus::Connecting);
                        self.publish();
                    }
                },

                result = await_connect(&mut connecting) => {
                    connecting = None;
                    match result {
                        Ok(ch) => {
                            channel = Some(ch);
                            self.on_connected();
                        }
                        Err(e) => self.on_channel_lost(Some(e)),
                    }
                }

                Some(joined) = self.fetches.join_next() => self.finish_snapshot(joined),

                frame = next_frame(&mut channel) => match frame {
                    Some(text) => self.handle_frame(&text),
                    None => {
                        channel = None;
                        self.on_channel_lost(None);
                    }
                },
            }
        }

        self.fetches.abort_all();
        drop(channel);
        tracing::debug!("Dashboard runner stopped");
        self.state
    }

    fn connect(&self) -> ConnectFuture<C::Channel> {
        let connector = self.connector.clone();
        Box::pin(async move { connector.connect().await })
    }

    fn publish(&self) {
        self.publisher.publish(self.state.view());
    }

    fn on_connected(&mut self) {
        tracing::info!("Live channel established");
        self.state.set_status(ChannelStatus::Connected);
        self.publish();

        // Events may have been missed while the previous channel was down.
        if self.connected_once {
            self.request_snapshot("reconnect");
        }
        self.connected_once = true;
    }

    fn on_channel_lost(&mut self, error: Option<ChannelError>) {
        counter!("channel_disconnects_total").increment(1);
        match &error {
            Some(e) => tracing::error!(error = %e, "Live channel could not be established"),
            None => tracing::warn!("Live channel closed, keeping last known state"),
        }

        self.state.set_status(ChannelStatus::Disconnected);
        self.publish();
        self.publisher.notify(Notification::error(
            "Live connection lost. Reconnect to resume live updates.",
        ));
    }

    fn handle_frame(&mut self, text: &str) {
        let event = match parse_frame(text) {
            Ok(event) => event,
            Err(FrameError::UnknownKind(kind)) => {
                counter!("live_frames_dropped_total").increment(1);
                tracing::debug!(kind = %kind, "Ignoring unknown live event");
                return;
            }
            Err(e) => {
                counter!("live_frames_dropped_total").increment(1);
                tracing::warn!(error = %e, raw = %text, "Dropping undecodable live frame");
                return;
            }
        };

        let kind = event.kind();
        counter!("live_events_total", "kind" => kind).increment(1);

        let Some(change) = event.normalize() else {
            counter!("live_frames_dropped_total").increment(1);
            tracing::warn!(kind, "Dropping live event with incomplete payload");
            return;
        };

        let notification = match &change {
            StateChange::Log(message) => {
                tracing::debug!(message = %message, "Backend log");
                self.publisher.log(message.clone());
                return;
            }
            StateChange::AddContract(contract) => {
                tracing::info!(address = %contract.address, group = %contract.group, "New contract");
                contract_notification(contract)
            }
            StateChange::AddTransaction(tx) => {
                tracing::info!(
                    token = %tx.token_address,
                    kind = %tx.kind,
                    status = %tx.status,
                    usd = %tx.dollar_amount,
                    "New transaction"
                );
                transaction_notification(tx)
            }
        };

        if !self.fetches.is_empty() {
            self.since_fetch.push(change.clone());
        }
        self.state.apply(change);
        self.publish();
        self.publisher.notify(notification);

        if self.config.reconcile_on_event {
            self.request_snapshot("event");
        }
    }

    /// Start a snapshot load unless one is in flight; in that case a single
    /// follow-up load is queued for when it lands.
    fn request_snapshot(&mut self, trigger: &'static str) {
        if !self.fetches.is_empty() {
            self.refetch_pending = true;
            tracing::debug!(trigger, "Snapshot already in flight, coalescing");
            return;
        }

        tracing::debug!(trigger, "Loading snapshot");
        let source = self.source.clone();
        let timeout = self.config.snapshot_timeout;
        self.fetches
            .spawn(async move { load_snapshot(source.as_ref(), timeout).await });
    }

    fn finish_snapshot(&mut self, joined: Result<Result<Snapshot, SnapshotError>, JoinError>) {
        let replay = std::mem::take(&mut self.since_fetch);
        match joined {
            Ok(Ok(snapshot)) => {
                self.state.apply_snapshot(snapshot);
                if !replay.is_empty() {
                    tracing::debug!(count = replay.len(), "Replaying events received during snapshot load");
                }
                for change in replay {
                    self.state.apply(change);
                }
                self.publish();
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, read = e.read, "Snapshot load failed, keeping last known state");
                self.publisher
                    .notify(Notification::error(format!("Failed to refresh dashboard: {e}")));
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => tracing::error!(error = %e, "Snapshot task panicked"),
        }

        if self.refetch_pending {
            self.refetch_pending = false;
            self.request_snapshot("coalesced");
        }
    }
}

async fn await_connect<Ch>(pending: &mut Option<ConnectFuture<Ch>>) -> Result<Ch, ChannelError> {
    match pending {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn next_frame<Ch: LiveChannel>(channel: &mut Option<Ch>) -> Option<String> {
    match channel {
        Some(ch) => ch.recv().await,
        None => std::future::pending().await,
    }
}
