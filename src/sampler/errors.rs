use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the sampler API.
///
/// Per-line and per-file failures during a scan are logged and skipped; only
/// request-level problems reach the caller.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Another scan owned by this sampler has not reached its terminal snapshot.
    #[error("Scan already in progress")]
    ScanInProgress,
    /// The request violates a size constraint.
    #[error("Invalid scan request: {0}")]
    InvalidRequest(String),
    /// A match file could not be opened, seeked or read.
    #[error("Failed to read match file {path}: {source}")]
    FileUnreadable {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The match directory could not be listed.
    #[error("Failed to list match files in {path}: {source}")]
    Discover {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The background worker thread could not be started.
    #[error("Failed to start scan worker: {0}")]
    Spawn(std::io::Error),
}
