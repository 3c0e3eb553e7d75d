//! Shared data types for Recollect: chat messages, memory namespaces,
//! episodes, tool errors, and the chat transport contract.

mod tool;
mod transport;

pub use tool::ToolError;
pub use transport::{ChatTransport, TransportError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// Speaker role for a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-generated message.
    System,
    /// User-authored message.
    User,
    /// Assistant-authored message.
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Isolation key scoping memory reads and writes to one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryNamespace(String);

impl MemoryNamespace {
    /// Namespace used when the session carries no identity.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Wrap an already-derived namespace string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The sentinel namespace for sessions without identity.
    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }
}

impl fmt::Display for MemoryNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity established by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub username: String,
}

impl AuthenticatedUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Format of an episode body as understood by the memory service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeSource {
    Text,
    Json,
    Message,
}

impl EpisodeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeSource::Text => "text",
            EpisodeSource::Json => "json",
            EpisodeSource::Message => "message",
        }
    }
}

/// Write-only memory record sent to the memory service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Episode {
    /// Episode name.
    pub name: String,
    /// Episode content.
    pub body: String,
    /// Body format.
    pub source: EpisodeSource,
    /// Free-form description of where the body came from.
    pub source_description: String,
    /// Namespace the episode is stored under.
    pub namespace: MemoryNamespace,
}

impl Episode {
    /// Build an episode for a raw user chat message.
    pub fn from_user_message(
        body: impl Into<String>,
        namespace: MemoryNamespace,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: format!(
                "chat-message-{}",
                created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            ),
            body: body.into(),
            source: EpisodeSource::Message,
            source_description: "chat user message".to_string(),
            namespace,
        }
    }

    /// Arguments for the memory service's `add_memory` tool.
    pub fn to_tool_arguments(&self) -> Value {
        json!({
            "name": self.name,
            "episode_body": self.body,
            "source": self.source.as_str(),
            "source_description": self.source_description,
            "group_id": self.namespace.as_str(),
        })
    }
}
