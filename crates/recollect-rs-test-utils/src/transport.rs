use async_trait::async_trait;
use parking_lot::Mutex;
use recollect_rs_protocol::{ChatTransport, TransportError};
use std::sync::Arc;

/// Transport that keeps everything it was asked to deliver.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    tokens: Arc<Mutex<Vec<String>>>,
    finals: Arc<Mutex<Vec<String>>>,
    closed: bool,
    reject_final: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose receiver has already gone away.
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    /// Accepts tokens but loses the connection before the final message.
    pub fn rejecting_final() -> Self {
        Self {
            reject_final: true,
            ..Self::default()
        }
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().clone()
    }

    pub fn streamed(&self) -> String {
        self.tokens.lock().concat()
    }

    pub fn finals(&self) -> Vec<String> {
        self.finals.lock().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn stream_token(&self, delta: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.tokens.lock().push(delta.to_string());
        Ok(())
    }

    async fn send_final(&self, content: &str) -> Result<(), TransportError> {
        if self.closed || self.reject_final {
            return Err(TransportError::Closed);
        }
        self.finals.lock().push(content.to_string());
        Ok(())
    }
}
