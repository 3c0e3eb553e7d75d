//! Contract between the turn pipeline and whatever delivers text to the user.

use async_trait::async_trait;

/// Errors raised while delivering output to the chat UI.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The receiving side has gone away.
    #[error("transport closed")]
    Closed,
    /// Output could not be encoded for the wire.
    #[error("encode error: {0}")]
    Encode(String),
    /// IO failure while writing output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Delivery channel for one chat turn.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Forward one streamed delta to the user.
    async fn stream_token(&self, delta: &str) -> Result<(), TransportError>;

    /// Finish the message with its complete content.
    async fn send_final(&self, content: &str) -> Result<(), TransportError>;
}
