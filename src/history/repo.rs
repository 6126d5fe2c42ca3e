use super::{sort_shortlog, timestamp_token, HistoryProvider, SinceBound};
use crate::error::{Result, ReviewersError};
use crate::model::{Stat, Stats};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository, ThreadSafeRepository};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tracing::debug;

type AncestorSet = Arc<HashSet<ObjectId>>;
type TouchedPaths = Arc<HashSet<String>>;

/// History provider backed by `gix`.
///
/// Holds a thread-safe handle so each blocking query can open its own
/// thread-local repository. The paths each commit touched are computed once
/// and shared by every per-file query.
pub struct GixHistory {
    repo: ThreadSafeRepository,
    path: PathBuf,
    hidden: Mutex<Option<(ObjectId, AncestorSet)>>,
    touched: Mutex<HashMap<ObjectId, TouchedPaths>>,
}

impl GixHistory {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self {
            repo: repo.into_sync(),
            path,
            hidden: Mutex::new(None),
            touched: Mutex::new(HashMap::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn local(&self) -> Repository {
        self.repo.to_thread_local()
    }

    /// `bound` and all of its ancestors, memoized for the last bound seen.
    fn hidden_commits(&self, repo: &Repository, bound: ObjectId) -> Result<AncestorSet> {
        if let Ok(guard) = self.hidden.lock() {
            if let Some((id, set)) = guard.as_ref() {
                if *id == bound {
                    return Ok(Arc::clone(set));
                }
            }
        }

        let set = Arc::new(ancestors(repo, bound)?);
        if let Ok(mut guard) = self.hidden.lock() {
            *guard = Some((bound, Arc::clone(&set)));
        }
        Ok(set)
    }

    /// Files changed by `commit` relative to `parent_id` (or the empty tree).
    ///
    /// The diff runs outside the lock, so two queries racing on the same
    /// commit may both compute it; the first insert wins.
    fn touched_paths(
        &self,
        repo: &Repository,
        commit: &gix::Commit<'_>,
        parent_id: Option<ObjectId>,
    ) -> Result<TouchedPaths> {
        if let Ok(guard) = self.touched.lock() {
            if let Some(paths) = guard.get(&commit.id) {
                return Ok(Arc::clone(paths));
            }
        }

        let paths = Arc::new(commit_changes(repo, commit, parent_id)?);
        if let Ok(mut guard) = self.touched.lock() {
            return Ok(Arc::clone(guard.entry(commit.id).or_insert(paths)));
        }
        Ok(paths)
    }
}

impl HistoryProvider for GixHistory {
    fn diff_changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>> {
        let repo = self.local();
        let base_tree = repo.find_commit(resolve_commit(&repo, base)?)?.tree()?;
        let head_tree = repo.find_commit(resolve_commit(&repo, head)?)?.tree()?;

        let changes: Vec<ChangeDetached> =
            repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)?;

        // a rename is listed under its new name, as `git diff --name-only` does
        let mut paths: Vec<String> = changes.iter().filter_map(changed_file).collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    fn authorship_counts(&self, path: &str, since: &SinceBound) -> Result<Vec<Stat>> {
        let bound = match since {
            SinceBound::Revision(rev) => rev,
            SinceBound::Empty => return Ok(Vec::new()),
        };

        let repo = self.local();
        let bound_id = ObjectId::from_hex(bound.as_bytes())
            .map_err(|e| ReviewersError::Reference(format!("Invalid since bound '{bound}': {e}")))?;
        let hidden = self.hidden_commits(&repo, bound_id)?;

        let mut head = repo.head()?;
        let head_commit = head.peel_to_commit_in_place()?;

        let mut stats = Stats::new();
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([head_commit.id]);

        while let Some(commit_id) = stack.pop_back() {
            if hidden.contains(&commit_id) || !seen.insert(commit_id) {
                continue;
            }

            let commit = repo.find_commit(commit_id)?;
            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();

            // merges are skipped but still traversed
            if parents.len() <= 1
                && self
                    .touched_paths(&repo, &commit, parents.first().copied())?
                    .contains(path)
            {
                let author = commit.author()?;
                let identity = format!("{} <{}>", author.name, author.email);
                stats.add_to_set(Stat::new(identity, 1));
            }

            for pid in parents {
                stack.push_back(pid);
            }
        }

        let mut stats = stats.into_vec();
        sort_shortlog(&mut stats);
        Ok(stats)
    }

    fn resolve_since_bound(&self, since: &str) -> Result<SinceBound> {
        let repo = self.local();
        let threshold = parse_commit_or_date(&repo, since)?.timestamp();

        let mut head = repo.head()?;
        let head_commit = head.peel_to_commit_in_place()?;

        let mut oldest: Option<(i64, ObjectId)> = None;
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut stack: VecDeque<ObjectId> = VecDeque::from([head_commit.id]);

        while let Some(commit_id) = stack.pop_back() {
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = repo.find_commit(commit_id)?;
            let secs = commit.time()?.seconds;
            if secs >= threshold && oldest.map_or(true, |(t, _)| secs <= t) {
                oldest = Some((secs, commit_id));
            }

            for pid in commit.parent_ids() {
                stack.push_back(pid.into());
            }
        }

        let bound = match oldest {
            Some((_, id)) => SinceBound::Revision(id.to_string()),
            None => SinceBound::Empty,
        };
        debug!(since, ?bound, "resolved since bound");
        Ok(bound)
    }

    fn timestamp_of(&self, reference: &str) -> Result<String> {
        let repo = self.local();
        let commit = repo.find_commit(resolve_commit(&repo, reference)?)?;
        let secs = commit.time()?.seconds;
        Ok(timestamp_token(secs))
    }
}

fn resolve_commit(repo: &Repository, rev: &str) -> Result<ObjectId> {
    let id = repo
        .rev_parse_single(rev)
        .map_err(|e| ReviewersError::Reference(format!("Invalid revision '{rev}': {e}")))?;

    let commit = id
        .object()?
        .try_into_commit()
        .map_err(|_| ReviewersError::Reference(format!("Not a commit: {rev}")))?;

    Ok(commit.id)
}

fn ancestors(repo: &Repository, start: ObjectId) -> Result<HashSet<ObjectId>> {
    let mut seen: HashSet<ObjectId> = HashSet::new();
    let mut stack: Vec<ObjectId> = vec![start];

    while let Some(commit_id) = stack.pop() {
        if !seen.insert(commit_id) {
            continue;
        }
        let commit = repo.find_commit(commit_id)?;
        for pid in commit.parent_ids() {
            stack.push(pid.into());
        }
    }

    Ok(seen)
}

fn commit_changes(
    repo: &Repository,
    commit: &gix::Commit<'_>,
    parent_id: Option<ObjectId>,
) -> Result<HashSet<String>> {
    let commit_tree = commit.tree()?;
    let changes: Vec<ChangeDetached> = match parent_id {
        Some(pid) => {
            let parent_tree = repo.find_commit(pid)?.tree()?;
            repo.diff_tree_to_tree(Some(&parent_tree), Some(&commit_tree), None)?
        }
        None => repo.diff_tree_to_tree(None, Some(&commit_tree), None)?,
    };

    Ok(changes.iter().flat_map(touched_files).collect())
}

/// The file a change leaves behind. Directory entries are skipped.
fn changed_file(change: &ChangeDetached) -> Option<String> {
    match change {
        ChangeDetached::Addition { location, entry_mode, .. }
        | ChangeDetached::Deletion { location, entry_mode, .. }
        | ChangeDetached::Modification { location, entry_mode, .. }
        | ChangeDetached::Rewrite { location, entry_mode, .. } => {
            (!entry_mode.is_tree()).then(|| location.to_string())
        }
    }
}

/// Every file a change touches: both sides of a rename count, since a
/// path-limited log matches the commit under either name.
fn touched_files(change: &ChangeDetached) -> Vec<String> {
    let mut files: Vec<String> = changed_file(change).into_iter().collect();
    if let ChangeDetached::Rewrite {
        source_location,
        source_entry_mode,
        ..
    } = change
    {
        if !source_entry_mode.is_tree() {
            files.push(source_location.to_string());
        }
    }
    files
}

fn parse_commit_or_date(repo: &Repository, input: &str) -> Result<DateTime<Utc>> {
    // RFC3339
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    // YYYY-MM-DD
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&datetime));
        }
    }

    // Relative duration (e.g. "2 weeks ago", "90days")
    if let Some(duration) = parse_relative_duration(input) {
        let target = SystemTime::now()
            .checked_sub(duration)
            .ok_or_else(|| ReviewersError::InvalidDate(format!("Duration overflow for '{input}'")))?;
        return Ok(DateTime::<Utc>::from(target));
    }

    // Fallback to Git ref
    let commit = repo
        .find_commit(resolve_commit(repo, input).map_err(|e| {
            ReviewersError::InvalidDate(format!("Invalid date or commit '{input}': {e}"))
        })?)?;
    let secs = commit.time()?.seconds;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| ReviewersError::InvalidDate(format!("Invalid timestamp: {secs}")))
}

fn parse_relative_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();

    let units: [(&str, u64); 4] = [
        (" days ago", 86400),
        (" weeks ago", 7 * 86400),
        (" months ago", 30 * 86400),
        (" years ago", 365 * 86400),
    ];
    for (suffix, secs) in units {
        if let Some(n) = input.strip_suffix(suffix) {
            if let Ok(n) = n.trim().parse::<u64>() {
                return n.checked_mul(secs).map(Duration::from_secs);
            }
        }
    }

    humantime::parse_duration(&input).ok()
}
