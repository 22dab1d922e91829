use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connect failed: {0}")]
    Connect(String),
}

/// An established push channel delivering raw text frames.
#[async_trait]
pub trait LiveChannel: Send {
    /// Next text frame, or `None` once the channel is gone.
    async fn recv(&mut self) -> Option<String>;
}

/// Establishes live channels. A session owns one connector and asks it for
/// a fresh channel on every activation or reconnect.
#[async_trait]
pub trait ChannelConnector: Send + Sync + 'static {
    type Channel: LiveChannel + 'static;

    async fn connect(&self) -> Result<Self::Channel, ChannelError>;
}

#[async_trait]
impl LiveChannel for mpsc::Receiver<String> {
    async fn recv(&mut self) -> Option<String> {
        mpsc::Receiver::recv(self).await
    }
}
