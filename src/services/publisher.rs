use metrics::gauge;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use super::notifier::{Notification, Notifier};
use crate::api::ws_types::{LogLine, WsMessage};
use crate::session::DashboardView;

/// Fan-out toward the rendering side: the latest view on a watch channel,
/// every update and toast on the dashboard broadcast.
#[derive(Clone)]
pub struct ViewPublisher {
    view_tx: Arc<watch::Sender<DashboardView>>,
    ws_tx: broadcast::Sender<WsMessage>,
    notifier: Option<Arc<Notifier>>,
}

impl ViewPublisher {
    pub fn new(ws_tx: broadcast::Sender<WsMessage>, notifier: Option<Arc<Notifier>>) -> Self {
        let (view_tx, _) = watch::channel(DashboardView::default());
        Self {
            view_tx: Arc::new(view_tx),
            ws_tx,
            notifier,
        }
    }

    pub fn latest(&self) -> DashboardView {
        self.view_tx.borrow().clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<DashboardView> {
        self.view_tx.subscribe()
    }

    pub fn subscribe_ws(&self) -> broadcast::Receiver<WsMessage> {
        self.ws_tx.subscribe()
    }

    pub fn publish(&self, view: DashboardView) {
        gauge!("dashboard_profit_usd").set(view.metrics.profit.to_f64().unwrap_or(0.0));
        gauge!("dashboard_active_contracts").set(view.metrics.active_contracts as f64);
        gauge!("wallet_balance").set(view.balance.to_f64().unwrap_or(0.0));

        // `latest()` must never lag a broadcast State.
        self.view_tx.send_replace(view.clone());
        // No subscribers is fine: nobody is looking at the dashboard yet.
        let _ = self.ws_tx.send(WsMessage::State(Box::new(view)));
    }

    pub fn notify(&self, notification: Notification) {
        if let Some(notifier) = &self.notifier {
            let notifier = notifier.clone();
            let text = notification.message.clone();
            tokio::spawn(async move {
                notifier.send(&text).await;
            });
        }
        let _ = self.ws_tx.send(WsMessage::Notification(notification));
    }

    pub fn log(&self, message: String) {
        let _ = self.ws_tx.send(WsMessage::Log(LogLine { message }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tokio::sync::broadcast::error::RecvError;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_broadcast_view_is_never_ahead_of_latest() {
        let (ws_tx, _) = broadcast::channel(4096);
        let publisher = ViewPublisher::new(ws_tx, None);
        let mut rx = publisher.subscribe_ws();

        let writer = publisher.clone();
        let producer = tokio::spawn(async move {
            for i in 1..=2000 {
                writer.publish(DashboardView {
                    balance: Decimal::from(i),
                    ..DashboardView::default()
                });
            }
        });

        let mut seen = 0;
        while seen < 2000 {
            match rx.recv().await {
                Ok(WsMessage::State(view)) => {
                    assert!(publisher.latest().balance >= view.balance);
                    seen = view.balance.to_i64().unwrap_or_default();
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
        }
        producer.await.unwrap();
    }
}
