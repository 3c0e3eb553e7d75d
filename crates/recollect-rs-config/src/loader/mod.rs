//! Layered configuration loading.
//!
//! Layers are read in precedence order (user, cwd, then each runtime file),
//! checked for unknown keys and wrong types, deep-merged, and decoded into a
//! `RecollectConfig` whose invariants are then validated.

mod layer_io;
mod merge;
mod schema;

#[cfg(test)]
mod tests;

use crate::{ConfigError, MAX_QUERY_CHARS_LIMIT, RecollectConfig};
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "recollect.json5";
const CONFIG_DIR_NAME: &str = ".recollect";

/// Merged config and the layers it came from, lowest precedence first.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: RecollectConfig,
    pub layers: Vec<ConfigLayer>,
}

/// Where a layer was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    User,
    Cwd,
    /// Passed on the command line; applied last.
    Runtime,
}

impl ConfigLayerSource {
    pub fn name(self) -> &'static str {
        match self {
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: Option<PathBuf>,
}

/// Where to look for layers.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory searched for `recollect.json5`.
    pub cwd: PathBuf,
    /// User layer; `None` skips it.
    pub user_config_path: Option<PathBuf>,
    pub runtime_paths: Vec<PathBuf>,
}

impl LayeredConfigOptions {
    /// Default locations: `~/.recollect/recollect.json5` and
    /// `<cwd>/recollect.json5`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: layer_io::user_layer_path(),
            runtime_paths: Vec::new(),
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Layer candidates in the order they are applied.
    fn plan(&self) -> Vec<(ConfigLayerSource, PathBuf)> {
        let user = self
            .user_config_path
            .iter()
            .map(|path| (ConfigLayerSource::User, path.clone()));
        let cwd = std::iter::once((ConfigLayerSource::Cwd, self.cwd.join(CONFIG_FILE_NAME)));
        let runtime = self
            .runtime_paths
            .iter()
            .map(|path| (ConfigLayerSource::Runtime, path.clone()));
        user.chain(cwd).chain(runtime).collect()
    }
}

impl RecollectConfig {
    /// Read one file, without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading config from path (path={})", path.display());
        let contents =
            fs::read_to_string(path).map_err(|err| ConfigError::read_failed(path, err))?;
        Self::load_from_str(&contents)
    }

    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        let value: Value = json5::from_str(contents)?;
        decode(value, "config")
    }

    /// Load with default layer locations for `cwd`.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let mut seen = HashSet::new();
        let mut layers = Vec::new();
        let mut merged = Value::Object(Map::new());

        for (source, path) in options.plan() {
            let key = path.canonicalize().unwrap_or_else(|_| path.clone());
            if !seen.insert(key) {
                debug!(
                    "config file already applied (source={}, path={})",
                    source.name(),
                    path.display()
                );
                continue;
            }
            if let Some(layer) = layer_io::read_layer(source, &path)? {
                merge::merge_json_values(&mut merged, &layer.value);
                layers.push(layer.meta);
            }
        }

        let config = decode(merged, "effective")?;
        info!(
            "config loaded (layers={}, memory_enabled={}, auth_enabled={})",
            layers.len(),
            config.memory.enabled,
            config.auth.enabled
        );
        Ok(LayeredConfig { config, layers })
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limit = self.memory.max_query_chars;
        if !(1..=MAX_QUERY_CHARS_LIMIT).contains(&limit) {
            return Err(field_error(
                "memory.max_query_chars",
                format!("must be between 1 and {MAX_QUERY_CHARS_LIMIT}"),
            ));
        }
        if self
            .memory
            .command
            .as_deref()
            .is_some_and(|command| command.trim().is_empty())
        {
            return Err(field_error("memory.command", "must not be empty"));
        }
        if self.sessions.max_sessions == 0 {
            return Err(field_error("sessions.max_sessions", "must be at least 1"));
        }
        if self.auth.enabled && self.auth.users.is_empty() {
            return Err(ConfigError::Invalid(
                "auth is enabled but no users are configured".to_string(),
            ));
        }
        let blank_entry = self
            .auth
            .users
            .iter()
            .any(|(user, password)| user.is_empty() || password.is_empty());
        if blank_entry {
            return Err(field_error(
                "auth.users",
                "usernames and passwords must be non-empty",
            ));
        }
        Ok(())
    }
}

fn decode(value: Value, label: &str) -> Result<RecollectConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: RecollectConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

fn field_error(path: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_string(),
        message: message.into(),
    }
}
