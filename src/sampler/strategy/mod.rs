//! Scanning policies that feed parsed records into reservoirs.
//!
//! All strategies share [`ScanContext`] for qualification, cancellation and
//! progress; they differ only in how much of each file they read.

mod context;
mod full;
mod lines;
mod per_file;
mod random_probe;


use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::SyncSender;

use rand::Rng;
use tracing::{info, warn};

use super::filter::ResultNames;
use super::progress::{ProgressEmitter, ProgressSnapshot, ScanInterrupt, ScanOutcome};
use super::request::{SamplerOptions, ScanRequest};

pub(crate) use context::ScanContext;
pub use random_probe::{MIN_PROBES_PER_FILE, probes_per_file};

/// Which scanning policy a request uses.
///
/// Only `Full` yields an exact uniform sample; the bounded variants are
/// best-effort approximations for inputs too large to read completely.
/// Under every strategy, qualifying lines read from a file before it fails
/// to decode or the scan is canceled stay in the sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStrategy {
    /// Read every line of every file into one reservoir.
    Full,
    /// Read every line, keeping at most `bound` candidates per file.
    PerFile { bound: usize },
    /// Probe `max(4, bound / 10)` random offsets per file.
    RandomProbe { bound: usize },
}

impl SamplingStrategy {
    pub fn per_file_bound(&self) -> Option<usize> {
        match self {
            SamplingStrategy::Full => None,
            SamplingStrategy::PerFile { bound } | SamplingStrategy::RandomProbe { bound } => {
                Some(*bound)
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SamplingStrategy::Full => "full",
            SamplingStrategy::PerFile { .. } => "per-file",
            SamplingStrategy::RandomProbe { .. } => "random-probe",
        }
    }

    /// Whether the resulting sample is an exact uniform draw.
    pub fn is_exact(&self) -> bool {
        matches!(self, SamplingStrategy::Full)
    }
}

/// A file queued for scanning, with its size frozen at scan start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MatchFile {
    pub(crate) path: PathBuf,
    pub(crate) size: u64,
}

/// Why a single file stopped early.
#[derive(Debug)]
pub(crate) enum FileScanError {
    Interrupted(ScanInterrupt),
    Unreadable(io::Error),
}

impl From<ScanInterrupt> for FileScanError {
    fn from(interrupt: ScanInterrupt) -> Self {
        FileScanError::Interrupted(interrupt)
    }
}

impl From<io::Error> for FileScanError {
    fn from(err: io::Error) -> Self {
        FileScanError::Unreadable(err)
    }
}

/// Run one request to its terminal snapshot on the calling thread.
///
/// Returns the outcome and whether the terminal snapshot reached the consumer.
pub(crate) fn run_scan<R: Rng>(
    request: &ScanRequest,
    names: &ResultNames,
    options: &SamplerOptions,
    cancel: &AtomicBool,
    sender: SyncSender<ProgressSnapshot>,
    rng: R,
) -> (ScanOutcome, bool) {
    let files = measure_files(&request.files);
    let total_bytes = files.iter().map(|file| file.size).sum::<u64>();
    info!(
        strategy = request.strategy.label(),
        files = files.len(),
        bytes = total_bytes,
        reservoir = request.reservoir_size,
        "Starting match scan"
    );
    let progress = ProgressEmitter::new(sender, options.snapshot_interval, total_bytes, files.len());
    let mut ctx = ScanContext::new(request, names, options, cancel, progress, rng);
    let result = match request.strategy {
        SamplingStrategy::Full => full::run(&mut ctx, &files),
        SamplingStrategy::PerFile { bound } => per_file::run(&mut ctx, &files, bound),
        SamplingStrategy::RandomProbe { bound } => random_probe::run(&mut ctx, &files, bound),
    };
    let outcome = match result {
        Ok(()) => ScanOutcome::Completed,
        Err(ScanInterrupt::Canceled) => {
            info!("Match scan canceled; keeping partial sample");
            ScanOutcome::Canceled
        }
        Err(ScanInterrupt::Disconnected) => {
            info!("Progress consumer disconnected; stopping match scan");
            ScanOutcome::Canceled
        }
    };
    ctx.finish(outcome)
}

/// Visit files in order, skipping unreadable ones.
///
/// Cancellation is checked before each file so no file is opened after the
/// flag is observed.
pub(super) fn for_each_file<'a, R, F>(
    ctx: &mut ScanContext<'a, R>,
    files: &[MatchFile],
    mut scan_file: F,
) -> Result<(), ScanInterrupt>
where
    R: Rng,
    F: FnMut(&mut ScanContext<'a, R>, &MatchFile) -> Result<(), FileScanError>,
{
    for file in files {
        ctx.check_canceled()?;
        match scan_file(ctx, file) {
            Ok(()) => ctx.file_finished(file),
            Err(FileScanError::Unreadable(source)) => ctx.file_skipped(file, source),
            Err(FileScanError::Interrupted(interrupt)) => return Err(interrupt),
        }
    }
    Ok(())
}

fn measure_files(paths: &[PathBuf]) -> Vec<MatchFile> {
    paths
        .iter()
        .map(|path| {
            let size = match fs::metadata(path) {
                Ok(meta) => meta.len(),
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "Failed to read match file size"
                    );
                    0
                }
            };
            MatchFile {
                path: path.clone(),
                size,
            }
        })
        .collect()
}
