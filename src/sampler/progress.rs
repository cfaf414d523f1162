//! Progress snapshots and the bounded channel that carries them to the consumer.

use std::collections::HashSet;
use std::sync::mpsc::{SyncSender, TrySendError};

use tracing::debug;

/// How a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every file was visited (unreadable files are skipped, not fatal).
    Completed,
    /// The caller canceled, or the consumer went away, before the end.
    Canceled,
}

/// Point-in-time view of a running scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    /// Share of the scan's bytes accounted for, in `[0, 1]`.
    pub fraction_complete: f64,
    /// Qualifying records seen so far (probe hits for random probing).
    pub qualifying_count: u64,
    /// Current reservoir contents.
    pub sample: Vec<String>,
    /// `Some` only on the final snapshot of a scan.
    pub terminal: Option<ScanOutcome>,
    /// Files in the request, counted once at scan start.
    pub files_total: usize,
    /// Files fully visited so far, skipped ones included.
    pub files_done: usize,
    /// Files dropped because they could not be opened or decoded.
    pub files_skipped: usize,
}

impl ProgressSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// Sample with repeated seeds removed, keeping first occurrences.
    pub fn unique_sample(&self) -> Vec<&str> {
        let mut seen = HashSet::with_capacity(self.sample.len());
        self.sample
            .iter()
            .map(String::as_str)
            .filter(|seed| seen.insert(*seed))
            .collect()
    }
}

/// Why the worker stopped before visiting every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanInterrupt {
    Canceled,
    Disconnected,
}

/// Writer side of the progress channel plus the byte/evaluation accounting
/// used to build snapshots.
pub(crate) struct ProgressEmitter {
    sender: SyncSender<ProgressSnapshot>,
    snapshot_interval: u64,
    evaluations: u64,
    total_bytes: u64,
    completed_bytes: u64,
    pub(crate) files_total: usize,
    pub(crate) files_done: usize,
    pub(crate) files_skipped: usize,
}

impl ProgressEmitter {
    pub(crate) fn new(
        sender: SyncSender<ProgressSnapshot>,
        snapshot_interval: u64,
        total_bytes: u64,
        files_total: usize,
    ) -> Self {
        Self {
            sender,
            snapshot_interval: snapshot_interval.max(1),
            evaluations: 0,
            total_bytes,
            completed_bytes: 0,
            files_total,
            files_done: 0,
            files_skipped: 0,
        }
    }

    /// Count one evaluation; true when a periodic snapshot is due.
    pub(crate) fn tick(&mut self) -> bool {
        self.evaluations += 1;
        self.evaluations % self.snapshot_interval == 0
    }

    pub(crate) fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Fraction complete with `in_file` bytes of the current file consumed.
    pub(crate) fn fraction(&self, in_file: u64) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        let done = self.completed_bytes.saturating_add(in_file);
        (done as f64 / self.total_bytes as f64).min(1.0)
    }

    /// Account for a whole file, whether it was read or skipped.
    pub(crate) fn complete_file(&mut self, size: u64, skipped: bool) {
        self.completed_bytes = self.completed_bytes.saturating_add(size);
        self.files_done += 1;
        if skipped {
            self.files_skipped += 1;
        }
    }

    /// Queue a non-terminal snapshot. A full channel drops it, since the next
    /// snapshot supersedes it anyway.
    pub(crate) fn send_periodic(&self, snapshot: ProgressSnapshot) -> Result<(), ScanInterrupt> {
        match self.sender.try_send(snapshot) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("Progress channel full; dropping periodic snapshot");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(ScanInterrupt::Disconnected),
        }
    }

    /// Deliver the terminal snapshot, waiting for room if necessary.
    /// Returns false when the consumer is gone.
    pub(crate) fn send_terminal(self, snapshot: ProgressSnapshot) -> bool {
        self.sender.send(snapshot).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn snapshot(terminal: Option<ScanOutcome>) -> ProgressSnapshot {
        ProgressSnapshot {
            fraction_complete: 0.0,
            qualifying_count: 0,
            sample: Vec::new(),
            terminal,
            files_total: 0,
            files_done: 0,
            files_skipped: 0,
        }
    }

    #[test]
    fn tick_fires_on_interval() {
        let (tx, _rx) = mpsc::sync_channel(4);
        let mut emitter = ProgressEmitter::new(tx, 3, 0, 0);
        let due: Vec<bool> = (0..6).map(|_| emitter.tick()).collect();
        assert_eq!(due, [false, false, true, false, false, true]);
        assert_eq!(emitter.evaluations(), 6);
    }

    #[test]
    fn fraction_is_clamped_and_monotonic_across_files() {
        let (tx, _rx) = mpsc::sync_channel(1);
        let mut emitter = ProgressEmitter::new(tx, 10, 100, 2);
        assert_eq!(emitter.fraction(0), 0.0);
        assert_eq!(emitter.fraction(30), 0.3);
        emitter.complete_file(40, false);
        assert_eq!(emitter.fraction(0), 0.4);
        emitter.complete_file(60, true);
        assert_eq!(emitter.fraction(500), 1.0);
        assert_eq!(emitter.files_skipped, 1);
        assert_eq!(emitter.files_done, 2);
    }

    #[test]
    fn full_channel_drops_periodic_but_not_terminal() {
        let (tx, rx) = mpsc::sync_channel(1);
        let emitter = ProgressEmitter::new(tx, 1, 0, 0);
        emitter.send_periodic(snapshot(None)).unwrap();
        emitter.send_periodic(snapshot(None)).unwrap();
        assert_eq!(rx.try_recv().unwrap().terminal, None);
        assert!(emitter.send_terminal(snapshot(Some(ScanOutcome::Completed))));
        assert_eq!(rx.try_recv().unwrap().terminal, Some(ScanOutcome::Completed));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn disconnected_consumer_interrupts() {
        let (tx, rx) = mpsc::sync_channel(1);
        drop(rx);
        let emitter = ProgressEmitter::new(tx, 1, 0, 0);
        assert_eq!(
            emitter.send_periodic(snapshot(None)),
            Err(ScanInterrupt::Disconnected)
        );
        assert!(!emitter.send_terminal(snapshot(None)));
    }

    #[test]
    fn unique_sample_keeps_first_occurrence() {
        let mut snap = snapshot(None);
        snap.sample = vec!["B".into(), "A".into(), "B".into()];
        assert_eq!(snap.unique_sample(), ["B", "A"]);
    }
}
