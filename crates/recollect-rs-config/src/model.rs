//! Configuration schema for Recollect.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on the search query prefix sent to the memory service.
pub const MAX_QUERY_CHARS_LIMIT: usize = 200;

/// Root config for a Recollect deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecollectConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
}

impl RecollectConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> RecollectConfigBuilder {
        RecollectConfigBuilder::new()
    }
}

/// Builder for assembling a `RecollectConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct RecollectConfigBuilder {
    config: RecollectConfig,
}

impl RecollectConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: RecollectConfig::default(),
        }
    }

    /// Replace the model configuration.
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the conversation history configuration.
    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.config.history = history;
        self
    }

    /// Replace the prompt configuration.
    pub fn prompt(mut self, prompt: PromptConfig) -> Self {
        self.config.prompt = prompt;
        self
    }

    /// Replace the authentication configuration.
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.config.auth = auth;
        self
    }

    /// Replace the HTTP server configuration.
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    /// Replace the session retention configuration.
    pub fn sessions(mut self, sessions: SessionConfig) -> Self {
        self.config.sessions = sessions;
        self
    }

    /// Finalize and return the built `RecollectConfig`.
    pub fn build(self) -> RecollectConfig {
        self.config
    }
}

/// Hosted model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with each request.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// API key; usually supplied through `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            name: default_model_name(),
            api_key: None,
            temperature: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

/// Knowledge-graph memory service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Disable to run plain chat without retrieval or episode writes.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Executable that speaks MCP over stdio.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default = "default_search_tool")]
    pub search_tool: String,
    #[serde(default = "default_add_tool")]
    pub add_tool: String,
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Bound on each search or add-episode call.
    #[serde(default = "default_memory_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub capture: CapturePolicyConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            search_tool: default_search_tool(),
            add_tool: default_add_tool(),
            max_query_chars: default_max_query_chars(),
            max_nodes: default_max_nodes(),
            timeout_ms: default_memory_timeout_ms(),
            capture: CapturePolicyConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_search_tool() -> String {
    "search_memory_nodes".to_string()
}

fn default_add_tool() -> String {
    "add_memory".to_string()
}

fn default_max_query_chars() -> usize {
    MAX_QUERY_CHARS_LIMIT
}

fn default_max_nodes() -> usize {
    5
}

fn default_memory_timeout_ms() -> u64 {
    10_000
}

/// Rules applied to a user message before it is stored as an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturePolicyConfig {
    #[serde(default = "default_true")]
    pub capture: bool,
    #[serde(default)]
    pub deny_patterns: Vec<String>,
    #[serde(default)]
    pub redact_patterns: Vec<String>,
    #[serde(default)]
    pub max_episode_chars: Option<usize>,
}

impl Default for CapturePolicyConfig {
    fn default() -> Self {
        Self {
            capture: true,
            deny_patterns: Vec::new(),
            redact_patterns: Vec::new(),
            max_episode_chars: None,
        }
    }
}

/// How much prior conversation is forwarded to the model each turn.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HistoryConfig {
    /// Prior messages to include; 0 keeps every turn independent.
    #[serde(default)]
    pub max_messages: usize,
}

/// Prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Login settings for the chat UI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Username to password map.
    #[serde(default)]
    pub users: HashMap<String, String>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

/// How long chat sessions are kept in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Open sessions kept at once; the least recently used is evicted.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Sessions unused for this long are dropped; 0 keeps them until evicted.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_max_sessions() -> usize {
    1_000
}

fn default_idle_timeout_secs() -> u64 {
    3_600
}
