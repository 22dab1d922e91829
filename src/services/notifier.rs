use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::models::{Contract, Transaction, TxKind, TxStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient user-facing message (toast) pushed alongside state updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }
}

/// Telegram forwarding for notifications. Failures are logged but never
/// block the session.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }

    /// Send a Telegram message. Failures are logged as warnings.
    pub async fn send(&self, message: &str) {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send Telegram notification");
            }
        }
    }
}

fn short(address: &str) -> String {
    if address.len() > 12 && address.is_ascii() {
        format!("{}...{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

pub fn contract_notification(contract: &Contract) -> Notification {
    Notification::new(
        NotificationLevel::Info,
        format!("New contract: {} ({})", short(&contract.address), contract.group),
    )
}

pub fn transaction_notification(tx: &Transaction) -> Notification {
    let token = short(&tx.token_address);
    match (tx.kind, tx.status) {
        (TxKind::Buy, TxStatus::Failed) => Notification::error(format!(
            "Buy failed: {} - {}",
            token,
            tx.error.as_deref().unwrap_or("unknown error"),
        )),
        (TxKind::Sell, TxStatus::Failed) => Notification::error(format!(
            "Sell failed: {} - {}",
            token,
            tx.error.as_deref().unwrap_or("unknown error"),
        )),
        (TxKind::Buy, _) => Notification::new(
            NotificationLevel::Success,
            format!("Buy executed: {} for ${}", token, tx.dollar_amount.round_dp(2)),
        ),
        (TxKind::Sell, _) => Notification::new(
            NotificationLevel::Success,
            format!("Sell executed: {} for ${}", token, tx.dollar_amount.round_dp(2)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_failed_buy_is_an_error_toast() {
        let tx = Transaction {
            id: None,
            token_address: "ABC".into(),
            kind: TxKind::Buy,
            dollar_amount: Decimal::ONE,
            native_amount: Decimal::ZERO,
            status: TxStatus::Failed,
            error: Some("slippage exceeded".into()),
            slippage: None,
            wallet_balance_after: None,
            timestamp: Utc::now(),
        };
        let n = transaction_notification(&tx);
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.message, "Buy failed: ABC - slippage exceeded");
    }

    #[test]
    fn test_long_addresses_are_shortened() {
        assert_eq!(short("So11111111111111111111111111111111111111112"), "So1111...1112");
        assert_eq!(short("ABC"), "ABC");
    }
}
