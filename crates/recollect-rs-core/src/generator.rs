//! Streaming response generation over a `ChatModel`.

use crate::error::ModelError;
use crate::llm::{ChatModel, DeltaStream};
use futures_util::StreamExt;
use log::debug;
use recollect_rs_protocol::ChatMessage;
use std::sync::Arc;

/// Starts generations against a shared model.
#[derive(Clone)]
pub struct ResponseGenerator {
    model: Arc<dyn ChatModel>,
}

impl ResponseGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Begin generating a reply to `messages`. No retries are attempted.
    pub async fn generate(&self, messages: &[ChatMessage]) -> Result<Generation, ModelError> {
        debug!(
            "starting generation (model={}, messages={})",
            self.model.name(),
            messages.len()
        );
        let stream = self.model.stream_chat(messages).await?;
        Ok(Generation::new(stream))
    }
}

/// An in-flight reply; deltas are pulled lazily and accumulated.
pub struct Generation {
    stream: DeltaStream,
    content: String,
    done: bool,
}

impl Generation {
    pub fn new(stream: DeltaStream) -> Self {
        Self {
            stream,
            content: String::new(),
            done: false,
        }
    }

    /// Pull the next delta. After the first error or the end of the stream
    /// this keeps returning `None`.
    pub async fn next(&mut self) -> Option<Result<String, ModelError>> {
        if self.done {
            return None;
        }
        match self.stream.next().await {
            Some(Ok(delta)) => {
                self.content.push_str(&delta);
                Some(Ok(delta))
            }
            Some(Err(err)) => {
                self.done = true;
                Some(Err(err))
            }
            None => {
                self.done = true;
                None
            }
        }
    }

    /// Concatenation of every delta yielded so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}
