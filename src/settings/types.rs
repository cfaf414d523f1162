use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sampler::{FilterSpec, MatchSource, ResultNames, SamplerOptions, SamplingStrategy};

/// Everything persisted in `config.toml`. Missing tables and keys fall back
/// to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sampler: SamplerSettings,
    /// Filter used when the command line does not override it.
    pub filter: FilterSpec,
    pub source: SourceSettings,
}

impl Settings {
    /// Raise zero sizes and intervals to one so a hand-edited file cannot
    /// produce a request the sampler rejects.
    pub fn normalized(mut self) -> Self {
        let sampler = &mut self.sampler;
        sampler.reservoir_size = sampler.reservoir_size.max(1);
        sampler.per_file_bound = sampler.per_file_bound.max(1);
        sampler.snapshot_interval = sampler.snapshot_interval.max(1);
        sampler.channel_capacity = sampler.channel_capacity.max(1);
        sampler.poll_interval_ms = sampler.poll_interval_ms.max(1);
        self
    }
}

/// Strategy names as written in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    Full,
    PerFile,
    RandomProbe,
}

impl StrategyKind {
    /// Attach a per-file bound; ignored for `Full`.
    pub fn with_bound(self, bound: usize) -> SamplingStrategy {
        match self {
            StrategyKind::Full => SamplingStrategy::Full,
            StrategyKind::PerFile => SamplingStrategy::PerFile { bound },
            StrategyKind::RandomProbe => SamplingStrategy::RandomProbe { bound },
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(StrategyKind::Full),
            "per-file" | "per_file" | "perfile" => Ok(StrategyKind::PerFile),
            "random-probe" | "random_probe" | "probe" => Ok(StrategyKind::RandomProbe),
            other => Err(format!(
                "Unknown strategy '{other}' (expected full, per-file or random-probe)"
            )),
        }
    }
}

/// `[sampler]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub reservoir_size: usize,
    pub per_file_bound: usize,
    pub strategy: StrategyKind,
    pub snapshot_interval: u64,
    pub probe_full_scan_threshold: u64,
    pub channel_capacity: usize,
    pub poll_interval_ms: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        let options = SamplerOptions::default();
        Self {
            reservoir_size: 6,
            per_file_bound: 100,
            strategy: StrategyKind::Full,
            snapshot_interval: options.snapshot_interval,
            probe_full_scan_threshold: options.probe_full_scan_threshold,
            channel_capacity: options.channel_capacity,
            poll_interval_ms: 100,
        }
    }
}

impl SamplerSettings {
    pub fn options(&self) -> SamplerOptions {
        SamplerOptions {
            snapshot_interval: self.snapshot_interval,
            probe_full_scan_threshold: self.probe_full_scan_threshold,
            channel_capacity: self.channel_capacity,
        }
    }

    pub fn strategy(&self) -> SamplingStrategy {
        self.strategy.with_bound(self.per_file_bound)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `[source]` table: where match files live and how levels map to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub matches_dir: PathBuf,
    /// Ordered result names; level `n` resolves to the `n`-th entry.
    pub result_names: Vec<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            matches_dir: PathBuf::from("dist"),
            result_names: Vec::new(),
        }
    }
}

impl SourceSettings {
    pub fn match_source(&self) -> MatchSource {
        MatchSource::Directory(self.matches_dir.clone())
    }

    pub fn result_names(&self) -> ResultNames {
        ResultNames::from(self.result_names.clone())
    }
}
