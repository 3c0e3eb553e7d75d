//! Environment variable overrides applied on top of file layers.

use crate::RecollectConfig;
use log::debug;

/// API key for the hosted model.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Base URL override for OpenAI-compatible endpoints.
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
/// Model identifier override.
pub const ENV_MODEL: &str = "RECOLLECT_MODEL";
/// Memory service executable override.
pub const ENV_MEMORY_COMMAND: &str = "RECOLLECT_MEMORY_COMMAND";

impl RecollectConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using a custom lookup (used by tests).
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(api_key) = read(ENV_API_KEY) {
            debug!("model api key taken from environment (var={})", ENV_API_KEY);
            self.model.api_key = Some(api_key);
        }
        if let Some(base_url) = read(ENV_BASE_URL) {
            debug!("model base url overridden (base_url={})", base_url);
            self.model.base_url = base_url;
        }
        if let Some(model) = read(ENV_MODEL) {
            debug!("model name overridden (model={})", model);
            self.model.name = model;
        }
        if let Some(command) = read(ENV_MEMORY_COMMAND) {
            debug!("memory command overridden (command={})", command);
            self.memory.command = Some(command);
        }
    }
}
