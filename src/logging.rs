//! Tracing setup for the seedpick console.
//!
//! Every event at the configured level goes to a per-launch file under
//! `.seedpick/logs`. Stderr only shows warnings and errors so the live
//! progress line stays readable; stdout is reserved for sampled seeds.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, filter::LevelFilter, fmt, prelude::*};

use crate::app_dirs::{self, AppDirError};

/// Log files kept after pruning, including the current one.
const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "seedpick_";
const LOG_FILE_EXTENSION: &str = "log";
/// Environment variable holding an `EnvFilter` directive for the log file.
pub const LOG_FILTER_ENV: &str = "SEEDPICK_LOG";
const DEFAULT_FILTER: &str = "info";

const FILE_NAME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
const EVENT_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

struct ActiveLog {
    path: PathBuf,
    _guard: WorkerGuard,
}

static ACTIVE_LOG: OnceLock<ActiveLog> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// No base directory could be resolved for the logs folder.
    #[error("No suitable directory available for logs")]
    NoLogDir,
    /// Failed to create the logs folder.
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to list earlier log files for pruning.
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to remove an old log file.
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to format the launch timestamp.
    #[error("Failed to format log filename time: {0}")]
    FormatTime(#[from] time::error::Format),
    /// Another global subscriber is already installed.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
    /// Failed to create this launch's log file.
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<AppDirError> for LoggingError {
    fn from(error: AppDirError) -> Self {
        match error {
            AppDirError::NoBaseDir => LoggingError::NoLogDir,
            AppDirError::CreateDir { path, source } => LoggingError::CreateDir { path, source },
        }
    }
}

/// Install the global subscriber and return this launch's log file path.
///
/// Later calls return the same path without reinstalling anything. Callers
/// may keep running when this fails; they just lose logs.
pub fn init() -> Result<PathBuf, LoggingError> {
    if let Some(active) = ACTIVE_LOG.get() {
        return Ok(active.path.clone());
    }

    let dir = app_dirs::logs_dir()?;
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let file_name = log_file_name(OffsetDateTime::now_utc().to_offset(offset))?;
    let path = dir.join(&file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.clone(),
            source,
        })?;
    prune_old_logs(&dir, MAX_LOG_FILES)?;

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(&dir, &file_name));
    let timer = fmt::time::OffsetTime::new(offset, EVENT_TIME_FORMAT);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer.clone())
        .with_writer(file_writer)
        .with_filter(file_filter());
    let console_layer = fmt::layer()
        .with_timer(timer)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::WARN);
    tracing::subscriber::set_global_default(
        Registry::default().with(file_layer).with(console_layer),
    )?;

    let active = ACTIVE_LOG.get_or_init(|| ActiveLog {
        path,
        _guard: guard,
    });
    tracing::info!(path = %active.path.display(), "Logging initialized");
    Ok(active.path.clone())
}

fn file_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    let stamp = now.format(FILE_NAME_FORMAT)?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}.{LOG_FILE_EXTENSION}"))
}

fn is_log_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(LOG_FILE_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}

/// Delete the oldest launch logs beyond `keep`.
///
/// File names embed a zero-padded timestamp, so name order is launch order.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<(), LoggingError> {
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
        .map(|entry| entry.path())
        .filter(|path| is_log_file(path))
        .collect();
    logs.sort();
    let excess = logs.len().saturating_sub(keep);
    for path in logs.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}
