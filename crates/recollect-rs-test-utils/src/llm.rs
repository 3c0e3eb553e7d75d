use async_trait::async_trait;
use futures_util::stream;
use parking_lot::Mutex;
use recollect_rs_core::{ChatModel, DeltaStream, ModelError};
use recollect_rs_protocol::ChatMessage;
use std::sync::Arc;

/// Model streaming scripted deltas, optionally failing after them.
#[derive(Debug, Clone)]
pub struct StreamingModel {
    deltas: Vec<String>,
    fail_after: Option<String>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl StreamingModel {
    pub fn new<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deltas: deltas.into_iter().map(Into::into).collect(),
            fail_after: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Break the stream with `message` once every delta has been sent.
    pub fn failing_after(mut self, message: impl Into<String>) -> Self {
        self.fail_after = Some(message.into());
        self
    }

    /// Message lists received, one per request.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<Vec<ChatMessage>> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl ChatModel for StreamingModel {
    fn name(&self) -> &str {
        "streaming-stub"
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<DeltaStream, ModelError> {
        self.requests.lock().push(messages.to_vec());
        let mut items: Vec<Result<String, ModelError>> =
            self.deltas.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.fail_after {
            items.push(Err(ModelError::Stream(message.clone())));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

/// Model whose request fails before any output.
#[derive(Debug, Clone)]
pub struct FailingModel {
    message: String,
}

impl FailingModel {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ChatModel for FailingModel {
    fn name(&self) -> &str {
        "failing-stub"
    }

    async fn stream_chat(&self, _messages: &[ChatMessage]) -> Result<DeltaStream, ModelError> {
        Err(ModelError::Request(self.message.clone()))
    }
}
