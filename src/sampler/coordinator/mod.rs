//! Runs one scan at a time on a background thread and hands snapshots to a
//! polling consumer.


use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::errors::SamplerError;
use super::filter::ResultNames;
use super::progress::{ProgressSnapshot, ScanOutcome};
use super::request::{SamplerOptions, ScanRequest};
use super::strategy::run_scan;

/// Lifecycle of the sampler's current scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    /// A scan was submitted and its terminal snapshot has not been consumed.
    Running,
    Completed,
    Canceled,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Completed | ScanState::Canceled)
    }
}

impl From<ScanOutcome> for ScanState {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Completed => ScanState::Completed,
            ScanOutcome::Canceled => ScanState::Canceled,
        }
    }
}

/// Identifier of one submitted scan, unique per sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanId(u64);

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan-{}", self.0)
    }
}

/// State shared between the sampler, the handle and the worker thread.
struct ScanShared {
    state: Mutex<ScanState>,
    /// How the worker ended, recorded whether or not the consumer saw it.
    outcome: Mutex<Option<ScanOutcome>>,
    cancel: AtomicBool,
    abandoned: AtomicBool,
}

impl ScanShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(ScanState::Running),
            outcome: Mutex::new(None),
            cancel: AtomicBool::new(false),
            abandoned: AtomicBool::new(false),
        }
    }

    fn state(&self) -> ScanState {
        *lock_recovering(&self.state)
    }

    fn set_state(&self, state: ScanState) {
        *lock_recovering(&self.state) = state;
    }

    fn outcome(&self) -> Option<ScanOutcome> {
        *lock_recovering(&self.outcome)
    }

    fn record_outcome(&self, outcome: ScanOutcome) {
        *lock_recovering(&self.outcome) = Some(outcome);
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Scan state lock poisoned; recovering.");
        poisoned.into_inner()
    })
}

/// Consumer side of a running scan.
///
/// Dropping the handle before its terminal snapshot cancels the scan.
pub struct ScanHandle {
    id: ScanId,
    receiver: Receiver<ProgressSnapshot>,
    shared: Arc<ScanShared>,
    finished: bool,
}

impl ScanHandle {
    pub fn id(&self) -> ScanId {
        self.id
    }

    /// Drain every snapshot queued so far without blocking.
    ///
    /// The terminal snapshot is always the last one returned; later calls
    /// return nothing.
    pub fn poll(&mut self) -> Vec<ProgressSnapshot> {
        let mut snapshots = Vec::new();
        while !self.finished {
            match self.receiver.try_recv() {
                Ok(snapshot) => {
                    if let Some(outcome) = snapshot.terminal {
                        self.shared.set_state(outcome.into());
                        self.finished = true;
                    }
                    snapshots.push(snapshot);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!(scan = %self.id, "Scan worker exited without a final snapshot");
                    self.shared.set_state(ScanState::Canceled);
                    self.finished = true;
                }
            }
        }
        snapshots
    }

    /// Request cancellation. Repeated calls, and calls after the terminal
    /// snapshot was consumed, do nothing.
    pub fn cancel(&self) {
        if self.finished {
            return;
        }
        if !self.shared.cancel.swap(true, Ordering::AcqRel) {
            info!(scan = %self.id, "Scan cancel requested");
        }
    }

    /// True once the terminal snapshot has been returned by [`ScanHandle::poll`].
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.shared.abandoned.store(true, Ordering::Release);
        self.shared.cancel.store(true, Ordering::Release);
        debug!(scan = %self.id, "Scan handle dropped; canceling");
    }
}

struct ActiveScan {
    shared: Arc<ScanShared>,
    worker: JoinHandle<()>,
}

/// Entry point for sampling match files: owns at most one scan at a time.
pub struct MatchSampler {
    options: SamplerOptions,
    names: ResultNames,
    active: Option<ActiveScan>,
    next_id: u64,
}

impl MatchSampler {
    pub fn new(options: SamplerOptions) -> Self {
        Self {
            options,
            names: ResultNames::default(),
            active: None,
            next_id: 1,
        }
    }

    /// Builder-style variant of [`MatchSampler::set_result_names`].
    pub fn with_result_names(mut self, names: ResultNames) -> Self {
        self.names = names;
        self
    }

    /// Replace the result-name list used by later scans.
    pub fn set_result_names(&mut self, names: ResultNames) {
        self.names = names;
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    /// Current lifecycle state.
    ///
    /// A scan whose handle was dropped reports the worker's own outcome once
    /// the worker has exited, even if its terminal snapshot was never polled.
    pub fn state(&self) -> ScanState {
        let Some(active) = &self.active else {
            return ScanState::Idle;
        };
        let state = active.shared.state();
        if state == ScanState::Running
            && active.shared.abandoned.load(Ordering::Acquire)
            && active.worker.is_finished()
        {
            // No recorded outcome means the worker panicked mid-scan.
            return active
                .shared
                .outcome()
                .map_or(ScanState::Canceled, ScanState::from);
        }
        state
    }

    /// Start a scan on a background thread.
    ///
    /// Rejected with [`SamplerError::ScanInProgress`] until the previous
    /// scan's terminal snapshot has been consumed or its handle dropped and
    /// its worker exited.
    pub fn submit(&mut self, request: ScanRequest) -> Result<ScanHandle, SamplerError> {
        if self.state() == ScanState::Running {
            return Err(SamplerError::ScanInProgress);
        }
        request.validate()?;

        let id = ScanId(self.next_id);
        let (sender, receiver) = mpsc::sync_channel(self.options.channel_capacity.max(1));
        let shared = Arc::new(ScanShared::new());
        let worker_shared = Arc::clone(&shared);
        let names = self.names.clone();
        let options = self.options.clone();
        let worker = thread::Builder::new()
            .name(format!("seedpick-{id}"))
            .spawn(move || {
                let (outcome, delivered) = run_scan(
                    &request,
                    &names,
                    &options,
                    &worker_shared.cancel,
                    sender,
                    rand::rng(),
                );
                worker_shared.record_outcome(outcome);
                if !delivered {
                    debug!(scan = %id, "Final snapshot undelivered; consumer is gone");
                    worker_shared.set_state(outcome.into());
                }
            })
            .map_err(SamplerError::Spawn)?;

        self.next_id += 1;
        self.active = Some(ActiveScan {
            shared: Arc::clone(&shared),
            worker,
        });
        info!(scan = %id, "Scan submitted");
        Ok(ScanHandle {
            id,
            receiver,
            shared,
            finished: false,
        })
    }

    /// Non-blocking drain of a handle's snapshots.
    pub fn poll(&self, handle: &mut ScanHandle) -> Vec<ProgressSnapshot> {
        handle.poll()
    }

    /// Idempotent; does nothing once the scan has finished.
    pub fn cancel(&self, handle: &ScanHandle) {
        handle.cancel();
    }
}

impl Default for MatchSampler {
    fn default() -> Self {
        Self::new(SamplerOptions::default())
    }
}
