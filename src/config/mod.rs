use std::env;
use std::time::Duration;

use crate::session::{SessionConfig, StateLimits};

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Trading backend
    pub backend_url: String,
    pub live_channel_url: String,

    // Session
    pub reconcile_on_event: bool,
    pub snapshot_timeout_secs: u64,
    pub contract_window: usize,
    pub max_transactions: usize,

    // Notifications
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub notifications_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend_url = env::var("BACKEND_URL")
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.into())
            .trim_end_matches('/')
            .to_string();

        let live_channel_url = match env::var("LIVE_CHANNEL_URL") {
            Ok(url) => url,
            Err(_) => derive_ws_url(&backend_url)?,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            backend_url,
            live_channel_url,

            reconcile_on_event: env::var("RECONCILE_ON_EVENT")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            snapshot_timeout_secs: env::var("SNAPSHOT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            contract_window: env::var("CONTRACT_WINDOW")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),
            max_transactions: env::var("MAX_TRANSACTIONS")
                .unwrap_or_else(|_| "5000".into())
                .parse()
                .unwrap_or(5_000),

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),
            notifications_enabled: env::var("NOTIFICATIONS_ENABLED")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),
        })
    }

    /// Returns true if Telegram forwarding is configured and switched on.
    pub fn has_telegram(&self) -> bool {
        self.notifications_enabled
            && self.telegram_bot_token.is_some()
            && self.telegram_chat_id.is_some()
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reconcile_on_event: self.reconcile_on_event,
            snapshot_timeout: Duration::from_secs(self.snapshot_timeout_secs.max(1)),
            limits: StateLimits {
                contract_window: self.contract_window.max(1),
                max_transactions: self.max_transactions.max(1),
            },
        }
    }
}

/// `http://host:8000` -> `ws://host:8000/ws`, `https` -> `wss`.
pub fn derive_ws_url(backend_url: &str) -> anyhow::Result<String> {
    let base = backend_url.trim_end_matches('/');
    let ws = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        anyhow::bail!("BACKEND_URL must start with http:// or https://, got {backend_url}");
    };
    Ok(format!("{ws}/ws"))
}
