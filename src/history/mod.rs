//! Access to commit history.
//!
//! Everything the reviewer search needs from version control goes through
//! [`HistoryProvider`], so the aggregation pipeline can run against a real
//! repository or an in-memory fake.

pub mod command;
pub mod repo;
pub mod shortlog;

pub use command::GitCommandHistory;
pub use repo::GixHistory;

use crate::error::Result;
use crate::model::Stat;

/// Exclusive lower end of an authorship query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinceBound {
    /// Count commits after this revision up to the head.
    Revision(String),
    /// No commit is recent enough; every query is empty.
    Empty,
}

pub trait HistoryProvider: Send + Sync {
    /// Paths that differ between `base` and `head`.
    fn diff_changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>>;

    /// Per-author counts of non-merge commits touching `path` after `since`.
    fn authorship_counts(&self, path: &str, since: &SinceBound) -> Result<Vec<Stat>>;

    /// Oldest commit at or after `since`, as a query bound.
    fn resolve_since_bound(&self, since: &str) -> Result<SinceBound>;

    /// Commit time of `reference` as a token that sorts lexicographically.
    fn timestamp_of(&self, reference: &str) -> Result<String>;
}

pub(crate) fn timestamp_token(seconds: i64) -> String {
    format!("{:020}", seconds.max(0))
}

/// Shortlog ordering: most commits first, then identity.
pub(crate) fn sort_shortlog(stats: &mut [Stat]) {
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reviewer.cmp(&b.reviewer)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_tokens_sort_like_times() {
        let older = timestamp_token(999_999_999);
        let newer = timestamp_token(1_700_000_000);
        assert!(older < newer);
        assert_eq!(older.len(), newer.len());
    }

    #[test]
    fn shortlog_sort_breaks_ties_by_identity() {
        let mut stats = vec![Stat::new("zed", 2), Stat::new("amy", 2), Stat::new("bob", 5)];
        sort_shortlog(&mut stats);
        let names: Vec<_> = stats.iter().map(|s| s.reviewer.as_str()).collect();
        assert_eq!(names, vec!["bob", "amy", "zed"]);
    }
}
