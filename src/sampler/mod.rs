//! Streaming sampler over append-only match files.
//!
//! A [`ScanRequest`] names the files, a [`SamplingStrategy`], the reservoir
//! size and a [`FilterSpec`]. [`MatchSampler::submit`] runs it on a background
//! thread; the returned [`ScanHandle`] is polled for [`ProgressSnapshot`]s
//! until one carries a terminal [`ScanOutcome`].
//!
//! Files are never loaded whole: every line (or probe) is parsed, filtered and
//! offered to a fixed-capacity [`Reservoir`].

mod coordinator;
mod errors;
mod filter;
mod progress;
mod record;
mod request;
mod reservoir;
mod strategy;

pub use coordinator::{MatchSampler, ScanHandle, ScanId, ScanState};
pub use errors::SamplerError;
pub use filter::{FilterSpec, MatchMode, ResultNames, qualifies};
pub use progress::{ProgressSnapshot, ScanOutcome};
pub use record::{DEFAULT_LEVEL, Malformed, MatchRecord, looks_like_header, parse_line, split_fields};
pub use request::{
    MATCH_FILE_EXTENSION, MATCH_FILE_PREFIX, MatchSource, SamplerOptions, ScanRequest,
    is_match_file,
};
pub use reservoir::Reservoir;
pub use strategy::{MIN_PROBES_PER_FILE, SamplingStrategy, probes_per_file};
