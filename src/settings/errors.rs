use std::path::PathBuf;

use thiserror::Error;

use crate::app_dirs::AppDirError;

/// Errors that may occur while loading or saving `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No usable config directory found.
    #[error("No suitable config directory found")]
    NoConfigDir,
    /// Failed to create the config directory.
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path that failed to create.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the config file or its temporary sibling.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
}

impl From<AppDirError> for ConfigError {
    fn from(error: AppDirError) -> Self {
        match error {
            AppDirError::NoBaseDir => ConfigError::NoConfigDir,
            AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
        }
    }
}
