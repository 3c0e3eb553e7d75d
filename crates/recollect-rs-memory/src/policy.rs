//! Capture rules applied to a user message before it becomes an episode.

use crate::MemoryError;
use recollect_rs_config::CapturePolicyConfig;
use regex::Regex;

const REDACTION: &str = "[REDACTED]";

/// Compiled capture policy.
#[derive(Debug, Clone)]
pub struct CapturePolicy {
    capture: bool,
    deny: Vec<Regex>,
    redact: Vec<Regex>,
    max_chars: Option<usize>,
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self {
            capture: true,
            deny: Vec::new(),
            redact: Vec::new(),
            max_chars: None,
        }
    }
}

impl CapturePolicy {
    /// Compile patterns from config; invalid regexes are rejected.
    pub fn from_config(config: &CapturePolicyConfig) -> Result<Self, MemoryError> {
        Ok(Self {
            capture: config.capture,
            deny: compile(&config.deny_patterns)?,
            redact: compile(&config.redact_patterns)?,
            max_chars: config.max_episode_chars,
        })
    }

    /// Return the body to store, or `None` when the message must not be kept.
    pub fn apply(&self, body: &str) -> Option<String> {
        if !self.capture {
            return None;
        }
        if self.deny.iter().any(|regex| regex.is_match(body)) {
            return None;
        }
        let mut content = body.to_string();
        for regex in &self.redact {
            content = regex.replace_all(&content, REDACTION).into_owned();
        }
        if let Some(max_chars) = self.max_chars {
            content = truncate_chars(&content, max_chars);
        }
        if content.trim().is_empty() {
            return None;
        }
        Some(content)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, MemoryError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|err| MemoryError::Regex(format!("{pattern}: {err}")))
        })
        .collect()
}

/// Truncate a string to a maximum character count.
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}
