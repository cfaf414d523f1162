//! Qualification rules applied to every parsed record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::record::MatchRecord;

/// How a record's level is compared against [`FilterSpec::level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// `record.level >= filter.level`.
    #[default]
    AtLeast,
    /// `record.level == filter.level`.
    Exact,
}

/// Filter selecting which records are sampled.
///
/// A non-empty `selected_name` overrides the level comparison entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub mode: MatchMode,
    pub level: u32,
    pub selected_name: String,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            mode: MatchMode::AtLeast,
            level: 1,
            selected_name: String::new(),
        }
    }
}

impl FilterSpec {
    /// Match records whose level is at least `level`.
    pub fn at_least(level: u32) -> Self {
        Self {
            mode: MatchMode::AtLeast,
            level,
            selected_name: String::new(),
        }
    }

    /// Match records whose level is exactly `level`.
    pub fn exact(level: u32) -> Self {
        Self {
            mode: MatchMode::Exact,
            level,
            selected_name: String::new(),
        }
    }

    /// Restrict matches to a named result.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.selected_name = name.into();
        self
    }
}

/// Ordered result names supplied by the search executable.
///
/// Used to resolve records that carry a level but no name: level `n` refers
/// to the `n`-th name (1-based). Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultNames(Arc<[String]>);

impl ResultNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::<String>::into).collect())
    }

    /// Name for a 1-based level, if the list is long enough.
    pub fn for_level(&self, level: u32) -> Option<&str> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ResultNames {
    fn default() -> Self {
        Self::new(Vec::<String>::new())
    }
}

impl From<Vec<String>> for ResultNames {
    fn from(names: Vec<String>) -> Self {
        Self(names.into())
    }
}

/// Decide whether `record` satisfies `filter`.
///
/// Pure: identical arguments always produce the same answer.
pub fn qualifies(record: &MatchRecord, filter: &FilterSpec, names: &ResultNames) -> bool {
    if !filter.selected_name.is_empty() {
        let name = if record.name.is_empty() {
            names.for_level(record.level)
        } else {
            Some(record.name.as_str())
        };
        return name == Some(filter.selected_name.as_str());
    }
    match filter.mode {
        MatchMode::AtLeast => record.level >= filter.level,
        MatchMode::Exact => record.level == filter.level,
    }
}
