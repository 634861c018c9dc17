use async_trait::async_trait;
use parley_core::SignalMessage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket connect failed: {0}")]
    Connect(String),

    #[error("signal transport is not connected")]
    NotConnected,

    #[error("failed to encode signal message: {0}")]
    Encode(String),
}

/// Outbound half of the signaling channel.
///
/// Sends are fire-and-forget: a returned `Ok` means the frame was handed to
/// the underlying connection, not that it was delivered. Each peer session
/// holds its own reference, passed at construction.
#[async_trait]
pub trait SignalTransport: Send + Sync {
    async fn send(&self, msg: SignalMessage) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    async fn disconnect(&self);
}
