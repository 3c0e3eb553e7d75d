//! Locating and reading individual layer files.

use super::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ConfigLayer, ConfigLayerSource, schema};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// A layer file that was read and passed the key/type check.
pub(super) struct LayerFile {
    pub(super) meta: ConfigLayer,
    pub(super) value: Value,
}

/// Read the layer at `path`.
///
/// A missing file is `Ok(None)` for user and cwd layers; runtime layers were
/// named explicitly, so a missing file is an error.
pub(super) fn read_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<Option<LayerFile>, ConfigError> {
    if source != ConfigLayerSource::Runtime && !path.is_file() {
        debug!("no config layer found (source={}, path={})", source.name(), path.display());
        return Ok(None);
    }
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigError::read_failed(path, err))?;
    let value: Value = json5::from_str(&contents)?;
    schema::validate_layer_schema(&value, &format!("{}({})", source.name(), path.display()))?;
    debug!("read config layer (source={}, path={})", source.name(), path.display());
    Ok(Some(LayerFile {
        meta: ConfigLayer {
            source,
            path: Some(path.to_path_buf()),
        },
        value,
    }))
}

/// `~/.recollect/recollect.json5`, when a home directory is known.
pub(super) fn user_layer_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(dirs.home_dir().join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
