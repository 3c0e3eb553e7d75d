//! One chat turn: retrieve, augment, generate, stream, persist.

use crate::error::{CoreError, ModelError};
use crate::generator::{Generation, ResponseGenerator};
use crate::prompt::{augment, build_history};
use crate::session::ChatSession;
use log::{debug, error, info};
use recollect_rs_config::{MemoryConfig, RecollectConfig};
use recollect_rs_memory::{CapturePolicy, MemoryRetriever, MemoryWriter};
use recollect_rs_protocol::{ChatMessage, ChatTransport};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Result of a handled message.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Text delivered to the user with the final message.
    pub content: String,
    /// Generation failure shown to the user, if any.
    pub error: Option<String>,
    /// Background episode write, when one was started.
    pub memory_write: Option<JoinHandle<()>>,
}

/// Runs the memory-augmented pipeline for each incoming message.
#[derive(Clone)]
pub struct TurnController {
    generator: ResponseGenerator,
    memory: MemoryConfig,
    policy: Arc<CapturePolicy>,
    system_prompt: Option<String>,
    history_window: usize,
}

impl TurnController {
    pub fn new(
        generator: ResponseGenerator,
        memory: MemoryConfig,
        policy: Arc<CapturePolicy>,
    ) -> Self {
        Self {
            generator,
            memory,
            policy,
            system_prompt: None,
            history_window: 0,
        }
    }

    /// Build from config, compiling the capture policy.
    pub fn from_config(
        generator: ResponseGenerator,
        config: &RecollectConfig,
    ) -> Result<Self, CoreError> {
        let policy = CapturePolicy::from_config(&config.memory.capture)
            .map_err(|err| CoreError::Config(err.to_string()))?;
        Ok(Self::new(generator, config.memory.clone(), Arc::new(policy))
            .with_system_prompt(config.prompt.system_prompt.clone())
            .with_history_window(config.history.max_messages))
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    /// Number of prior messages forwarded each turn; 0 keeps turns independent.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Messages that would be sent to the model for `text` in `session`.
    pub async fn prepare_messages(&self, session: &ChatSession, text: &str) -> Vec<ChatMessage> {
        let namespace = session.namespace();
        let context = if self.memory.enabled {
            MemoryRetriever::new(Arc::clone(session.tools()), &self.memory)
                .search(text, namespace)
                .await
        } else {
            Default::default()
        };
        let prior = if self.history_window > 0 {
            session.history()
        } else {
            Vec::new()
        };
        let history = build_history(
            self.system_prompt.as_deref(),
            &prior,
            self.history_window,
            text,
        );
        augment(history, context.as_str())
    }

    /// Handle one user message end to end.
    ///
    /// Generation failures are reported to the user and in the outcome; only
    /// transport failures are returned as errors.
    pub async fn handle_message(
        &self,
        session: &ChatSession,
        text: &str,
        transport: &dyn ChatTransport,
    ) -> Result<TurnOutcome, CoreError> {
        info!(
            "handling message (session_id={}, namespace={}, chars={})",
            session.id(),
            session.namespace(),
            text.chars().count()
        );
        let messages = self.prepare_messages(session, text).await;
        debug!(
            "prompt prepared (session_id={}, messages={})",
            session.id(),
            messages.len()
        );

        let mut generation = match self.generator.generate(&messages).await {
            Ok(generation) => generation,
            Err(err) => return self.fail_before_output(session, err, transport).await,
        };

        if let Some(err) = stream_to(&mut generation, transport).await? {
            if generation.content().is_empty() {
                return self.fail_before_output(session, err, transport).await;
            }
            return self.fail_mid_stream(session, generation, err, transport).await;
        }

        let content = generation.into_content();
        transport.send_final(&content).await?;
        session.record_turn(text, &content, self.history_window);
        // Only exchanges the user actually received become episodes.
        let memory_write = if self.memory.enabled {
            MemoryWriter::new(
                Arc::clone(session.tools()),
                &self.memory,
                Arc::clone(&self.policy),
            )
            .record(text, session.namespace())
        } else {
            None
        };
        info!(
            "turn complete (session_id={}, reply_chars={}, memory_write={})",
            session.id(),
            content.chars().count(),
            memory_write.is_some()
        );
        Ok(TurnOutcome {
            content,
            error: None,
            memory_write,
        })
    }

    async fn fail_before_output(
        &self,
        session: &ChatSession,
        err: ModelError,
        transport: &dyn ChatTransport,
    ) -> Result<TurnOutcome, CoreError> {
        error!(
            "generation failed (session_id={}, model={}, error={})",
            session.id(),
            self.generator.model_name(),
            err
        );
        let message = err.to_string();
        let content = format!("Error: {message}");
        transport.send_final(&content).await?;
        Ok(TurnOutcome {
            content,
            error: Some(message),
            memory_write: None,
        })
    }

    async fn fail_mid_stream(
        &self,
        session: &ChatSession,
        generation: Generation,
        err: ModelError,
        transport: &dyn ChatTransport,
    ) -> Result<TurnOutcome, CoreError> {
        error!(
            "generation failed mid-stream (session_id={}, model={}, error={})",
            session.id(),
            self.generator.model_name(),
            err
        );
        let message = err.to_string();
        let notice = format!("\n\nError: {message}");
        transport.stream_token(&notice).await?;
        let mut content = generation.into_content();
        content.push_str(&notice);
        transport.send_final(&content).await?;
        Ok(TurnOutcome {
            content,
            error: Some(message),
            memory_write: None,
        })
    }
}

/// Forward deltas until the stream ends; returns the model error that cut
/// it short, if any.
async fn stream_to(
    generation: &mut Generation,
    transport: &dyn ChatTransport,
) -> Result<Option<ModelError>, CoreError> {
    while let Some(delta) = generation.next().await {
        match delta {
            Ok(delta) => transport.stream_token(&delta).await?,
            Err(err) => return Ok(Some(err)),
        }
    }
    Ok(None)
}
