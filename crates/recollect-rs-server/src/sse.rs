//! `ChatTransport` that writes server-sent events into a channel.

use async_trait::async_trait;
use axum::response::sse::Event;
use recollect_rs_protocol::{ChatTransport, TransportError};
use serde_json::json;
use std::convert::Infallible;
use tokio::sync::mpsc;

pub const TOKEN_EVENT: &str = "token";
pub const FINAL_EVENT: &str = "final";
pub const ERROR_EVENT: &str = "error";

pub type EventSender = mpsc::Sender<Result<Event, Infallible>>;

/// Delivers one turn's output as `token` and `final` events.
#[derive(Debug, Clone)]
pub struct SseTransport {
    tx: EventSender,
}

impl SseTransport {
    pub fn new(tx: EventSender) -> Self {
        Self { tx }
    }

    /// Emit an `error` event after a failed generation.
    pub async fn send_error(&self, message: &str) -> Result<(), TransportError> {
        self.emit(ERROR_EVENT, json!({ "message": message })).await
    }

    async fn emit(&self, name: &str, data: serde_json::Value) -> Result<(), TransportError> {
        let event = Event::default()
            .event(name)
            .json_data(data)
            .map_err(|err| TransportError::Encode(err.to_string()))?;
        self.tx
            .send(Ok(event))
            .await
            .map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl ChatTransport for SseTransport {
    async fn stream_token(&self, delta: &str) -> Result<(), TransportError> {
        self.emit(TOKEN_EVENT, json!({ "delta": delta })).await
    }

    async fn send_final(&self, content: &str) -> Result<(), TransportError> {
        self.emit(FINAL_EVENT, json!({ "content": content })).await
    }
}
