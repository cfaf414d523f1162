//! Where seedpick keeps its config and logs.
//!
//! Everything lives in one `.seedpick` folder under the OS config directory.
//! Setting `SEEDPICK_CONFIG_HOME` moves that folder under another base, which
//! is how tests and portable installs relocate it.

use std::{ffi::OsString, path::PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the config base.
pub const APP_DIR_NAME: &str = ".seedpick";
/// Environment variable that replaces the OS config directory as the base.
pub const CONFIG_HOME_ENV: &str = "SEEDPICK_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// Neither the override nor the OS provided a config directory.
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    /// Failed to create a directory under the application root.
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Resolved `.seedpick` root. Directories are created on first access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Root under an explicit base directory.
    pub fn under(base: impl Into<PathBuf>) -> Self {
        Self {
            root: base.into().join(APP_DIR_NAME),
        }
    }

    /// Root under `SEEDPICK_CONFIG_HOME`, or the OS config directory.
    pub fn from_env() -> Result<Self, AppDirError> {
        let fallback = BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf());
        select_base(std::env::var_os(CONFIG_HOME_ENV), fallback)
            .map(Self::under)
            .ok_or(AppDirError::NoBaseDir)
    }

    /// The root directory, created if missing.
    pub fn root(&self) -> Result<PathBuf, AppDirError> {
        ensure_dir(self.root.clone())
    }

    /// The `logs` directory inside the root, created if missing.
    pub fn logs(&self) -> Result<PathBuf, AppDirError> {
        ensure_dir(self.root.join(LOGS_DIR_NAME))
    }
}

/// Return the root `.seedpick` directory for this process, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    AppDirs::from_env()?.root()
}

/// Return the logs directory for this process, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    AppDirs::from_env()?.logs()
}

/// An empty override counts as unset.
fn select_base(override_base: Option<OsString>, fallback: Option<PathBuf>) -> Option<PathBuf> {
    override_base
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or(fallback)
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
