//! Recollect settings: the `RecollectConfig` model, JSON5 layer loading,
//! key/type checks, invariant validation, and environment overrides.

mod env;
mod error;
mod loader;
mod model;

pub use env::{ENV_API_KEY, ENV_BASE_URL, ENV_MEMORY_COMMAND, ENV_MODEL};
pub use error::ConfigError;
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
pub use model::*;
