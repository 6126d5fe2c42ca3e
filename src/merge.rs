//! Fan-in stage of the reviewer search.
//!
//! A [`Merger`] is owned by the single task draining the result channel, so
//! the aggregate has exactly one writer no matter how many queries run.

use crate::config::MergeOrder;
use crate::error::ReviewersError;
use crate::model::{FailedPath, Stat, Stats};
use std::collections::BTreeMap;
use tracing::warn;

/// Result of one per-path history query.
#[derive(Debug)]
pub struct PathOutcome {
    pub index: usize,
    pub path: String,
    pub result: Result<Vec<Stat>, ReviewersError>,
}

/// What is left once the merger is closed.
#[derive(Debug, Default)]
pub struct MergeSummary {
    pub stats: Stats,
    pub failed: Vec<FailedPath>,
    pub unfinished: Vec<String>,
}

pub struct Merger {
    order: MergeOrder,
    paths: Vec<String>,
    stats: Stats,
    failed: Vec<FailedPath>,
    reported: Vec<bool>,
    pending: BTreeMap<usize, PathOutcome>,
    next: usize,
}

impl Merger {
    pub fn new(order: MergeOrder, paths: &[String]) -> Self {
        Self {
            order,
            paths: paths.to_vec(),
            stats: Stats::new(),
            failed: Vec::new(),
            reported: vec![false; paths.len()],
            pending: BTreeMap::new(),
            next: 0,
        }
    }

    pub fn accept(&mut self, outcome: PathOutcome) {
        match self.reported.get_mut(outcome.index) {
            Some(seen) if !*seen => *seen = true,
            _ => {
                warn!(path = %outcome.path, "ignoring duplicate or unknown result");
                return;
            }
        }

        match self.order {
            MergeOrder::Arrival => self.apply(outcome),
            MergeOrder::Input => {
                self.pending.insert(outcome.index, outcome);
                while let Some(ready) = self.pending.remove(&self.next) {
                    self.apply(ready);
                    self.next += 1;
                }
            }
        }
    }

    /// Number of queries that have reported so far.
    pub fn received(&self) -> usize {
        self.reported.iter().filter(|r| **r).count()
    }

    /// Flush anything still buffered and account for paths that never
    /// reported. `abandoned` paths count as unfinished, the rest as failed.
    pub fn finish(mut self, abandoned: bool) -> MergeSummary {
        let buffered = std::mem::take(&mut self.pending);
        for (_, outcome) in buffered {
            self.apply(outcome);
        }

        let mut unfinished = Vec::new();
        for (index, seen) in self.reported.iter().enumerate() {
            if *seen {
                continue;
            }
            let path = self.paths[index].clone();
            if abandoned {
                unfinished.push(path);
            } else {
                self.failed.push(FailedPath {
                    path,
                    error: "history query ended without a result".to_string(),
                });
            }
        }

        MergeSummary {
            stats: self.stats,
            failed: self.failed,
            unfinished,
        }
    }

    fn apply(&mut self, outcome: PathOutcome) {
        match outcome.result {
            Ok(stats) => {
                for stat in stats {
                    if !stat.reviewer.is_empty() {
                        self.stats.add_to_set(stat);
                    }
                }
            }
            Err(err) => {
                warn!(path = %outcome.path, error = %err, "history query failed");
                self.failed.push(FailedPath {
                    path: outcome.path,
                    error: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("file{i}.rs")).collect()
    }

    fn ok(index: usize, stats: &[(&str, u32)]) -> PathOutcome {
        PathOutcome {
            index,
            path: format!("file{index}.rs"),
            result: Ok(stats.iter().map(|(r, c)| Stat::new(*r, *c)).collect()),
        }
    }

    fn failed(index: usize) -> PathOutcome {
        PathOutcome {
            index,
            path: format!("file{index}.rs"),
            result: Err(ReviewersError::Provider("bad object".into())),
        }
    }

    fn reviewers(stats: &Stats) -> Vec<String> {
        stats.iter().map(|s| s.reviewer.clone()).collect()
    }

    #[test]
    fn arrival_order_applies_immediately() {
        let mut merger = Merger::new(MergeOrder::Arrival, &paths(2));
        merger.accept(ok(1, &[("bob", 1)]));
        merger.accept(ok(0, &[("alice", 1)]));

        let summary = merger.finish(false);
        assert_eq!(reviewers(&summary.stats), vec!["bob", "alice"]);
    }

    #[test]
    fn input_order_buffers_until_predecessors_arrive() {
        let mut merger = Merger::new(MergeOrder::Input, &paths(3));
        merger.accept(ok(2, &[("carol", 1)]));
        merger.accept(ok(1, &[("bob", 1)]));
        assert_eq!(merger.received(), 2);
        merger.accept(ok(0, &[("alice", 1)]));

        let summary = merger.finish(false);
        assert_eq!(reviewers(&summary.stats), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn empty_identities_are_dropped() {
        let mut merger = Merger::new(MergeOrder::Arrival, &paths(1));
        merger.accept(ok(0, &[("", 4), ("alice", 1)]));

        let summary = merger.finish(false);
        assert_eq!(summary.stats.len(), 1);
    }

    #[test]
    fn failures_are_collected_not_merged() {
        let mut merger = Merger::new(MergeOrder::Input, &paths(3));
        merger.accept(ok(0, &[("alice", 2)]));
        merger.accept(failed(1));
        merger.accept(ok(2, &[("bob", 1), ("alice", 1)]));

        let summary = merger.finish(false);
        assert_eq!(summary.stats.top(3), vec![Stat::new("alice", 3), Stat::new("bob", 1)]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].path, "file1.rs");
        assert!(summary.unfinished.is_empty());
    }

    #[test]
    fn missing_results_count_as_failed_or_unfinished() {
        let mut merger = Merger::new(MergeOrder::Input, &paths(3));
        merger.accept(ok(2, &[("carol", 1)]));

        let summary = merger.finish(true);
        assert_eq!(summary.unfinished, vec!["file0.rs", "file1.rs"]);
        assert_eq!(reviewers(&summary.stats), vec!["carol"]);

        let mut merger = Merger::new(MergeOrder::Arrival, &paths(2));
        merger.accept(ok(0, &[("alice", 1)]));
        let summary = merger.finish(false);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].path, "file1.rs");
    }

    #[test]
    fn duplicate_results_are_ignored() {
        let mut merger = Merger::new(MergeOrder::Arrival, &paths(1));
        merger.accept(ok(0, &[("alice", 1)]));
        merger.accept(ok(0, &[("alice", 1)]));
        merger.accept(ok(7, &[("mallory", 9)]));

        let summary = merger.finish(false);
        assert_eq!(summary.stats.top(3), vec![Stat::new("alice", 1)]);
    }
}
