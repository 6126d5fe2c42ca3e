use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

/// Commit count of one contributor over a set of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub reviewer: String,
    pub count: u32,
}

impl Stat {
    pub fn new(reviewer: impl Into<String>, count: u32) -> Self {
        Self {
            reviewer: reviewer.into(),
            count,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}\t{}", self.count, self.reviewer)
    }
}

/// Insertion-ordered set of [`Stat`] keyed by reviewer.
///
/// Entries keep the position at which their reviewer was first seen, which is
/// what breaks ties when ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    entries: Vec<Stat>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `stat.count` to the entry for `stat.reviewer`, appending it if the
    /// reviewer has not been seen yet.
    pub fn add_to_set(&mut self, stat: Stat) {
        match self.entries.iter_mut().find(|s| s.reviewer == stat.reviewer) {
            Some(existing) => existing.count += stat.count,
            None => self.entries.push(stat),
        }
    }

    /// Entries by descending count; equal counts keep insertion order.
    pub fn rank(&self) -> Vec<Stat> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<Stat> {
        let mut ranked = self.rank();
        ranked.truncate(n);
        ranked
    }

    pub fn totals(&self) -> HashMap<String, u32> {
        self.entries
            .iter()
            .map(|s| (s.reviewer.clone(), s.count))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stat> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Stat> {
        self.entries
    }
}

impl FromIterator<Stat> for Stats {
    fn from_iter<I: IntoIterator<Item = Stat>>(iter: I) -> Self {
        let mut stats = Stats::new();
        for stat in iter {
            stats.add_to_set(stat);
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPath {
    pub path: String,
    pub error: String,
}

/// Outcome of a reviewer search.
#[derive(Debug, Clone, Default)]
pub struct ReviewerReport {
    /// Ranked and truncated reviewers.
    pub reviewers: Vec<Stat>,
    /// Paths whose history query returned an error.
    pub failed: Vec<FailedPath>,
    /// Paths still outstanding when the deadline expired.
    pub unfinished: Vec<String>,
}

impl ReviewerReport {
    pub fn lines(&self) -> Vec<String> {
        self.reviewers.iter().map(Stat::to_string).collect()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() || !self.unfinished.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewersOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub repository_path: String,
    pub base: String,
    pub head: String,
    pub since: String,
    pub files: Vec<String>,
    pub reviewers: Vec<Stat>,
    pub failed_paths: Vec<FailedPath>,
    pub unfinished_paths: Vec<String>,
}
