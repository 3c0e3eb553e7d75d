//! Chat service facade used by the HTTP server and the terminal REPL.

use crate::auth::{CredentialVerifier, StaticCredentials};
use crate::error::CoreError;
use crate::generator::ResponseGenerator;
use crate::llm::{ChatModel, OpenAiChatModel};
use crate::session::{ChatSession, SessionId, SessionLimits, SessionManager};
use crate::turn::{TurnController, TurnOutcome};
use log::{info, warn};
use recollect_rs_config::RecollectConfig;
use recollect_rs_protocol::ChatTransport;
use recollect_rs_tools::{McpToolSource, ToolSource};
use std::sync::Arc;

/// Login material supplied when opening a session.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Owns sessions and runs turns against them.
pub struct ChatService {
    sessions: SessionManager,
    turns: TurnController,
    verifier: Option<Arc<dyn CredentialVerifier>>,
}

impl ChatService {
    /// Assemble a service from prebuilt parts. A `None` verifier makes every
    /// session anonymous.
    pub fn new(
        turns: TurnController,
        tool_source: Option<Arc<dyn ToolSource>>,
        verifier: Option<Arc<dyn CredentialVerifier>>,
    ) -> Self {
        Self {
            sessions: SessionManager::new(tool_source),
            turns,
            verifier,
        }
    }

    /// Build a service with the OpenAI-compatible model and MCP memory
    /// service described by `config`.
    pub fn from_config(config: &RecollectConfig) -> Result<Self, CoreError> {
        let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::from_config(&config.model)?);
        if config.model.api_key.is_none() {
            warn!("no model API key configured (model={})", config.model.name);
        }
        let source = McpToolSource::from_config(&config.memory)
            .map(|source| Arc::new(source) as Arc<dyn ToolSource>);
        if source.is_none() {
            info!("memory service not configured, chatting without memory");
        }
        Self::with_model(config, model, source)
    }

    /// Build from config with an explicit model and tool source.
    pub fn with_model(
        config: &RecollectConfig,
        model: Arc<dyn ChatModel>,
        tool_source: Option<Arc<dyn ToolSource>>,
    ) -> Result<Self, CoreError> {
        let turns = TurnController::from_config(ResponseGenerator::new(model), config)?;
        let verifier = config.auth.enabled.then(|| {
            Arc::new(StaticCredentials::from_config(&config.auth)) as Arc<dyn CredentialVerifier>
        });
        Ok(Self::new(turns, tool_source, verifier)
            .with_session_limits(SessionLimits::from_config(&config.sessions)))
    }

    pub fn with_session_limits(mut self, limits: SessionLimits) -> Self {
        self.sessions = self.sessions.with_limits(limits);
        self
    }

    pub fn auth_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    /// Open a session, authenticating first when login is enabled.
    pub async fn open_session(
        &self,
        credentials: Option<Credentials>,
    ) -> Result<Arc<ChatSession>, CoreError> {
        let user = match &self.verifier {
            None => None,
            Some(verifier) => {
                let credentials = credentials.ok_or(CoreError::Unauthorized)?;
                let user = verifier
                    .verify(&credentials.username, &credentials.password)
                    .await
                    .ok_or(CoreError::Unauthorized)?;
                Some(user)
            }
        };
        Ok(self.sessions.create(user).await)
    }

    pub fn session(&self, id: SessionId) -> Result<Arc<ChatSession>, CoreError> {
        self.sessions.get(id)
    }

    pub fn close_session(&self, id: SessionId) -> bool {
        self.sessions.remove(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Run one turn in session `id`.
    pub async fn send_message(
        &self,
        id: SessionId,
        text: &str,
        transport: &dyn ChatTransport,
    ) -> Result<TurnOutcome, CoreError> {
        let session = self.sessions.get(id)?;
        self.turns.handle_message(&session, text, transport).await
    }
}
