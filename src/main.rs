use std::sync::Arc;

use tokio::sync::broadcast;

use xcute_dashboard::api::router::create_router;
use xcute_dashboard::api::ws_types::WsMessage;
use xcute_dashboard::backend::BackendClient;
use xcute_dashboard::config::AppConfig;
use xcute_dashboard::ingestion::WsConnector;
use xcute_dashboard::services::{Notifier, ViewPublisher};
use xcute_dashboard::session::DashboardSession;
use xcute_dashboard::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // rustls needs an explicit process-wide provider for wss:// backends.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = xcute_dashboard::metrics::init_metrics()?;

    let notifier = match (&config.telegram_bot_token, &config.telegram_chat_id) {
        (Some(token), Some(chat)) if config.has_telegram() => {
            tracing::info!("Telegram notifications enabled");
            Some(Arc::new(Notifier::new(token.clone(), chat.clone())))
        }
        _ => None,
    };

    // --- WebSocket broadcast channel for dashboard clients ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(256);
    let publisher = ViewPublisher::new(ws_tx, notifier);

    // --- Dashboard session: snapshot loader + live channel ---
    let source = Arc::new(BackendClient::new(reqwest::Client::new(), config.backend_url.clone()));
    let connector = Arc::new(WsConnector::new(config.live_channel_url.clone()));

    tracing::info!(
        backend = %config.backend_url,
        live_channel = %config.live_channel_url,
        reconcile_on_event = config.reconcile_on_event,
        "Starting dashboard session"
    );

    let mut session = DashboardSession::new(source, connector, publisher.clone(), config.session_config());
    let handle = session.activate().await;

    let state = AppState {
        config,
        publisher,
        session: handle,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    session.teardown().await;
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();
}
