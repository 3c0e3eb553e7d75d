//! Recollect in one crate: the pipeline crates under short names, plus the
//! startup pieces the `recollect` binary needs (logging, config resolution,
//! terminal output).

pub mod terminal;

pub use recollect_rs_config as config;
pub use recollect_rs_core as core;
pub use recollect_rs_memory as memory;
pub use recollect_rs_protocol as protocol;
pub use recollect_rs_server as server;
pub use recollect_rs_tools as tools;

use log::info;
use recollect_rs_config::{ConfigError, LayeredConfigOptions, RecollectConfig};
use std::path::{Path, PathBuf};

pub use terminal::TerminalTransport;

/// Initialize `env_logger`; `RUST_LOG` overrides `default_filter`.
///
/// Safe to call more than once.
pub fn init_logging(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).try_init();
}

/// Layer options for `cwd` plus an optional `--config` file.
pub fn config_options(cwd: &Path, runtime: Option<PathBuf>) -> LayeredConfigOptions {
    let options = LayeredConfigOptions::new(cwd);
    match runtime {
        Some(path) => options.with_runtime_path(path),
        None => options,
    }
}

/// Resolve the effective config: layered files, then environment overrides.
pub fn load_config(options: LayeredConfigOptions) -> Result<RecollectConfig, ConfigError> {
    let layered = RecollectConfig::load_layered_with_options(options)?;
    for layer in &layered.layers {
        if let Some(path) = &layer.path {
            info!(
                "config layer applied (source={}, path={})",
                layer.source.name(),
                path.display()
            );
        }
    }
    let mut config = layered.config;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
