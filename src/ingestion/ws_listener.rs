use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::channel::{ChannelConnector, ChannelError, LiveChannel};

const PING_INTERVAL: Duration = Duration::from_secs(25);
const FRAME_BUFFER: usize = 1000;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the backend's WebSocket event endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// A live WebSocket connection. Frames are pumped by a background task;
/// dropping the channel aborts the task and closes the socket.
pub struct WsChannel {
    rx: mpsc::Receiver<String>,
    pump: JoinHandle<()>,
}

#[async_trait]
impl LiveChannel for WsChannel {
    async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    type Channel = WsChannel;

    async fn connect(&self) -> Result<WsChannel, ChannelError> {
        tracing::info!(url = %self.url, "Connecting to backend WebSocket...");

        let (ws_stream, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        tracing::info!("WebSocket connected successfully");

        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let pump = tokio::spawn(run_pump(ws_stream, tx));
        Ok(WsChannel { rx, pump })
    }
}

/// Forward text frames until the socket closes or the channel owner goes
/// away. Answers pings and keeps the connection alive with its own pings.
async fn run_pump(ws_stream: WsStream, tx: mpsc::Sender<String>) {
    let (mut write, mut read) = ws_stream.split();

    let mut ping_timer = interval(PING_INTERVAL);
    ping_timer.tick().await; // consume the first immediate tick

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(text.as_str().to_owned()).await.is_err() {
                            tracing::debug!("Channel owner dropped, stopping WebSocket pump");
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            tracing::warn!(error = %e, "Failed to send pong");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::warn!("WebSocket server sent close frame");
                        break;
                    }
                    Some(Ok(_)) => {} // binary and pong frames
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "WebSocket read error");
                        break;
                    }
                    None => {
                        tracing::warn!("WebSocket stream ended");
                        break;
                    }
                }
            }
            _ = ping_timer.tick() => {
                if let Err(e) = write.send(Message::Ping(vec![].into())).await {
                    tracing::warn!(error = %e, "Failed to send ping");
                    break;
                }
            }
        }
    }
    // Dropping `tx` here ends the channel for the session.
}
