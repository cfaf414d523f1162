use std::path::{Path, PathBuf};

use serde::de::Error as SerdeDeError;
use tracing::debug;

use super::CONFIG_FILE_NAME;
use super::errors::ConfigError;
use super::types::Settings;
use crate::app_dirs;

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir()?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from the app directory, returning defaults if the file is missing.
pub fn load_or_default() -> Result<Settings, ConfigError> {
    let path = config_path()?;
    load_from_path(&path)
}

/// Load settings from a specific file, returning defaults if it does not exist.
pub fn load_from_path(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "No config file; using defaults");
        return Ok(Settings::default());
    }
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    toml::from_str::<Settings>(&text)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
        .map(Settings::normalized)
}
