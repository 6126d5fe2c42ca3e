use super::shortlog::parse_shortlog;
use super::{sort_shortlog, timestamp_token, HistoryProvider, SinceBound};
use crate::error::{Result, ReviewersError};
use crate::model::Stat;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// History provider that shells out to the `git` binary.
pub struct GitCommandHistory {
    path: PathBuf,
}

impl GitCommandHistory {
    /// Use the repository containing `path`, or the current dir if `None`.
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let start = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let top = run_git(&start, &["rev-parse", "--show-toplevel"])
            .map_err(|e| ReviewersError::GitRepo(format!("{}: {e}", start.display())))?;

        Ok(Self {
            path: PathBuf::from(top.trim()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.path, args)
    }
}

impl HistoryProvider for GitCommandHistory {
    fn diff_changed_paths(&self, base: &str, head: &str) -> Result<Vec<String>> {
        let out = self.git(&["diff", "--name-only", base, head])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn authorship_counts(&self, path: &str, since: &SinceBound) -> Result<Vec<Stat>> {
        let bound = match since {
            SinceBound::Revision(rev) => rev,
            SinceBound::Empty => return Ok(Vec::new()),
        };
        let range = format!("{bound}..HEAD");
        let out = self.git(&["shortlog", "-sne", "--no-merges", &range, "--", path])?;

        let mut stats = parse_shortlog(&out);
        sort_shortlog(&mut stats);
        Ok(stats)
    }

    fn resolve_since_bound(&self, since: &str) -> Result<SinceBound> {
        let out = self.git(&["log", "--since", since, "--reverse", "--format=%H"])?;
        let bound = match out.lines().map(str::trim).find(|l| !l.is_empty()) {
            Some(rev) => SinceBound::Revision(rev.to_string()),
            None => SinceBound::Empty,
        };
        debug!(since, ?bound, "resolved since bound");
        Ok(bound)
    }

    fn timestamp_of(&self, reference: &str) -> Result<String> {
        let out = self.git(&["show", "-s", "--format=%ct", reference])?;
        let line = out.lines().next().unwrap_or("").trim().trim_matches('"');
        let secs = line
            .parse::<i64>()
            .map_err(|_| ReviewersError::Reference(format!("No commit time for '{reference}'")))?;
        Ok(timestamp_token(secs))
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()?;

    if !output.status.success() {
        return Err(ReviewersError::Command {
            command: format!("git {}", args.join(" ")),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
