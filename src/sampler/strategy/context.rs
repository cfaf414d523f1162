use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tracing::{debug, info, warn};

use super::MatchFile;
use crate::sampler::errors::SamplerError;
use crate::sampler::filter::{FilterSpec, ResultNames, qualifies};
use crate::sampler::progress::{ProgressEmitter, ProgressSnapshot, ScanInterrupt, ScanOutcome};
use crate::sampler::record::{Malformed, MatchRecord};
use crate::sampler::request::{SamplerOptions, ScanRequest};
use crate::sampler::reservoir::Reservoir;

/// State owned by the worker for the duration of one scan.
///
/// The worker is the only writer to `global`; consumers only see copies in
/// snapshots.
pub(crate) struct ScanContext<'a, R> {
    filter: &'a FilterSpec,
    names: &'a ResultNames,
    cancel: &'a AtomicBool,
    progress: ProgressEmitter,
    last_in_file: u64,
    pub(super) options: &'a SamplerOptions,
    pub(super) rng: R,
    pub(super) global: Reservoir,
}

impl<'a, R: Rng> ScanContext<'a, R> {
    pub(crate) fn new(
        request: &'a ScanRequest,
        names: &'a ResultNames,
        options: &'a SamplerOptions,
        cancel: &'a AtomicBool,
        progress: ProgressEmitter,
        rng: R,
    ) -> Self {
        Self {
            filter: &request.filter,
            names,
            cancel,
            progress,
            last_in_file: 0,
            options,
            rng,
            global: Reservoir::new(request.reservoir_size),
        }
    }

    /// Seed of a parsed line when it qualifies; malformed lines are logged.
    pub(super) fn qualifying_seed(
        &self,
        file: &MatchFile,
        parsed: Result<MatchRecord, Malformed>,
    ) -> Option<String> {
        match parsed {
            Ok(record) if qualifies(&record, self.filter, self.names) => Some(record.seed),
            Ok(_) => None,
            Err(malformed) => {
                debug!(
                    path = %file.path.display(),
                    error = %malformed,
                    "Skipping malformed match line"
                );
                None
            }
        }
    }

    /// Offer a qualifying seed straight to the global reservoir.
    pub(super) fn offer(&mut self, seed: String) {
        self.global.observe_with(seed, &mut self.rng);
    }

    /// Fold a per-file reservoir into the global one.
    pub(super) fn merge(&mut self, local: Reservoir) {
        self.global.merge_from_with(local, &mut self.rng);
    }

    /// Bookkeeping after every evaluated line or probe: emits a periodic
    /// snapshot when due, then checks the cancel flag.
    ///
    /// `pending` is a per-file reservoir not yet merged; its count is included
    /// in the reported qualifying total.
    pub(super) fn after_evaluation(
        &mut self,
        in_file: u64,
        pending: Option<&Reservoir>,
    ) -> Result<(), ScanInterrupt> {
        self.last_in_file = in_file;
        if self.progress.tick() {
            let snapshot = self.snapshot(pending, None);
            self.progress.send_periodic(snapshot)?;
        }
        self.check_canceled()
    }

    pub(super) fn check_canceled(&self) -> Result<(), ScanInterrupt> {
        if self.cancel.load(Ordering::Acquire) {
            return Err(ScanInterrupt::Canceled);
        }
        Ok(())
    }

    pub(super) fn file_finished(&mut self, file: &MatchFile) {
        self.last_in_file = 0;
        self.progress.complete_file(file.size, false);
        debug!(
            path = %file.path.display(),
            qualifying = self.global.seen(),
            "Finished match file"
        );
    }

    /// Skip an unreadable file, attributing its full size to progress.
    pub(super) fn file_skipped(&mut self, file: &MatchFile, source: io::Error) {
        self.last_in_file = 0;
        self.progress.complete_file(file.size, true);
        let err = SamplerError::FileUnreadable {
            path: file.path.clone(),
            source,
        };
        warn!(error = %err, "Skipping match file");
    }

    /// Emit the terminal snapshot. Returns the outcome and whether the
    /// consumer received it.
    pub(super) fn finish(self, outcome: ScanOutcome) -> (ScanOutcome, bool) {
        let mut snapshot = self.snapshot(None, Some(outcome));
        if outcome == ScanOutcome::Completed {
            snapshot.fraction_complete = 1.0;
        }
        info!(
            outcome = ?outcome,
            qualifying = self.global.seen(),
            sampled = self.global.len(),
            evaluations = self.progress.evaluations(),
            skipped_files = self.progress.files_skipped,
            "Match scan finished"
        );
        let delivered = self.progress.send_terminal(snapshot);
        (outcome, delivered)
    }

    fn snapshot(
        &self,
        pending: Option<&Reservoir>,
        terminal: Option<ScanOutcome>,
    ) -> ProgressSnapshot {
        ProgressSnapshot {
            fraction_complete: self.progress.fraction(self.last_in_file),
            qualifying_count: self.global.seen() + pending.map_or(0, Reservoir::seen),
            sample: self.global.items().to_vec(),
            terminal,
            files_total: self.progress.files_total,
            files_done: self.progress.files_done,
            files_skipped: self.progress.files_skipped,
        }
    }
}
