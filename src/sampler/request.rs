//! Scan requests, sampler tuning knobs and match-file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use super::errors::SamplerError;
use super::filter::FilterSpec;
use super::strategy::SamplingStrategy;

/// Filename prefix of match files written by the search executable.
pub const MATCH_FILE_PREFIX: &str = "matches_";
/// Extension of match files written by the search executable.
pub const MATCH_FILE_EXTENSION: &str = "csv";

/// One user-initiated sample action. Immutable for the lifetime of the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    /// Files to visit, in order.
    pub files: Vec<PathBuf>,
    pub strategy: SamplingStrategy,
    /// Capacity of the final sample; must be at least one.
    pub reservoir_size: usize,
    pub filter: FilterSpec,
}

impl ScanRequest {
    pub fn new(
        files: Vec<PathBuf>,
        strategy: SamplingStrategy,
        reservoir_size: usize,
        filter: FilterSpec,
    ) -> Self {
        Self {
            files,
            strategy,
            reservoir_size,
            filter,
        }
    }

    /// Reject zero-sized reservoirs and bounds.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if self.reservoir_size == 0 {
            return Err(SamplerError::InvalidRequest(
                "reservoir size must be at least 1".into(),
            ));
        }
        if self.strategy.per_file_bound() == Some(0) {
            return Err(SamplerError::InvalidRequest(
                "per-file bound must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Sampler-wide tuning shared by every scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerOptions {
    /// Evaluations between periodic snapshots.
    pub snapshot_interval: u64,
    /// Files smaller than this many bytes are scanned fully instead of probed.
    pub probe_full_scan_threshold: u64,
    /// Capacity of the progress channel.
    pub channel_capacity: usize,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            snapshot_interval: 2_000,
            probe_full_scan_threshold: 1_024,
            channel_capacity: 64,
        }
    }
}

/// Where the match files for a scan come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSource {
    /// Every `matches_*.csv` file directly inside a directory.
    Directory(PathBuf),
    /// One explicitly chosen file, used as-is.
    File(PathBuf),
}

impl MatchSource {
    /// Resolve to the ordered file list for a [`ScanRequest`].
    ///
    /// Directory listings are sorted by path so repeated scans visit files in
    /// the same order.
    pub fn resolve(&self) -> Result<Vec<PathBuf>, SamplerError> {
        match self {
            MatchSource::File(path) => Ok(vec![path.clone()]),
            MatchSource::Directory(dir) => list_match_files(dir),
        }
    }
}

/// True for `matches_*.csv` file names.
pub fn is_match_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.starts_with(MATCH_FILE_PREFIX)
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MATCH_FILE_EXTENSION))
}

fn list_match_files(dir: &Path) -> Result<Vec<PathBuf>, SamplerError> {
    let entries = fs::read_dir(dir).map_err(|source| SamplerError::Discover {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(
                    dir = %dir.display(),
                    error = %err,
                    "Failed to read directory entry while listing match files"
                );
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_ok_and(|ft| ft.is_file()) && is_match_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
