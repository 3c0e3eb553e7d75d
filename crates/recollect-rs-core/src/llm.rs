//! Streaming chat model abstraction and the OpenAI-compatible client.

use crate::error::ModelError;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::{Stream, StreamExt};
use log::{debug, info};
use recollect_rs_config::ModelConfig;
use recollect_rs_protocol::ChatMessage;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

/// Stream of text deltas produced by a model.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// A chat completion backend that streams its answer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Start a streamed completion for `messages`.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<DeltaStream, ModelError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Client for `{base_url}/chat/completions` with `stream: true`.
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f32>,
    http_client: reqwest::Client,
}

impl OpenAiChatModel {
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|err| ModelError::Request(err.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.name.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<DeltaStream, ModelError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            stream: true,
            temperature: self.temperature,
        };
        info!(
            "requesting streamed completion (model={}, messages={})",
            self.model,
            messages.len()
        );

        let mut request = self.http_client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|err| ModelError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|err| ModelError::Stream(err.to_string()))
            })
            .boxed();
        Ok(decode_event_stream(bytes))
    }
}

/// One decoded server-sent event relevant to chat streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A non-empty text delta.
    Delta(String),
    /// The `[DONE]` terminator.
    Done,
}

/// Incremental decoder for `data:` lines of an OpenAI streaming response.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence; only
/// complete lines are decoded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, ModelError> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = decode_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> Result<Option<SseEvent>, ModelError> {
        let line = std::mem::take(&mut self.buffer);
        decode_line(&line)
    }
}

fn decode_line(raw: &[u8]) -> Result<Option<SseEvent>, ModelError> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim_start();
    if payload == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }
    if payload.is_empty() {
        return Ok(None);
    }

    let chunk: Value =
        serde_json::from_str(payload).map_err(|err| ModelError::Decode(err.to_string()))?;
    if let Some(error) = chunk.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ModelError::Api(message));
    }
    let delta = chunk
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if delta.is_empty() {
        return Ok(None);
    }
    Ok(Some(SseEvent::Delta(delta.to_string())))
}

struct DecodeState {
    body: BoxStream<'static, Result<Vec<u8>, ModelError>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

impl DecodeState {
    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Delta(text) => self.pending.push_back(text),
                SseEvent::Done => {
                    self.finished = true;
                    break;
                }
            }
        }
    }
}

/// Turn a raw SSE byte stream into a stream of text deltas.
pub fn decode_event_stream(body: BoxStream<'static, Result<Vec<u8>, ModelError>>) -> DeltaStream {
    let state = DecodeState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };
    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(delta) = state.pending.pop_front() {
                return Some((Ok(delta), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => match state.decoder.push(&chunk) {
                    Ok(events) => state.absorb(events),
                    Err(err) => {
                        state.finished = true;
                        return Some((Err(err), state));
                    }
                },
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => {
                    debug!("model stream ended without terminator");
                    let tail = state.decoder.finish();
                    state.finished = true;
                    match tail {
                        Ok(Some(event)) => state.absorb(vec![event]),
                        Ok(None) => {}
                        Err(err) => return Some((Err(err), state)),
                    }
                }
            }
        }
    }))
}
