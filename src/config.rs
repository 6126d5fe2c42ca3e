use crate::error::{Result, ReviewersError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".reviewers.toml";
pub const DEFAULT_BASE: &str = "master";
pub const DEFAULT_HEAD: &str = "HEAD";
pub const DEFAULT_SINCE: &str = "2015-01-01";
pub const DEFAULT_LIMIT: usize = 3;

/// Order in which per-path results are folded into the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeOrder {
    /// Buffer results and apply them in input-path order (reproducible ties).
    #[default]
    Input,
    /// Apply results as soon as their query completes.
    Arrival,
}

/// Options for a single `find_files` / `find_reviewers` run.
#[derive(Debug, Clone)]
pub struct ReviewerOptions {
    pub show_files: bool,
    pub verbose: bool,
    pub since: String,
    pub ignored_extensions: Vec<String>,
    pub only_extensions: Vec<String>,
    pub ignored_paths: Vec<String>,
    pub only_paths: Vec<String>,
    pub base: String,
    pub head: String,
    pub limit: usize,
    pub merge_order: MergeOrder,
    pub fail_fast: bool,
    pub deadline: Option<Duration>,
    pub progress: bool,
}

impl Default for ReviewerOptions {
    fn default() -> Self {
        Self {
            show_files: false,
            verbose: false,
            since: DEFAULT_SINCE.to_string(),
            ignored_extensions: Vec::new(),
            only_extensions: Vec::new(),
            ignored_paths: Vec::new(),
            only_paths: Vec::new(),
            base: DEFAULT_BASE.to_string(),
            head: DEFAULT_HEAD.to_string(),
            limit: DEFAULT_LIMIT,
            merge_order: MergeOrder::default(),
            fail_fast: false,
            deadline: None,
            progress: false,
        }
    }
}

/// Contents of `.reviewers.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub base: Option<String>,
    pub since: Option<String>,
    pub limit: Option<usize>,
    pub merge_order: Option<MergeOrder>,
    pub fail_fast: Option<bool>,
    pub deadline_secs: Option<u64>,
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default)]
    pub ignored_extensions: Vec<String>,
    #[serde(default)]
    pub only_extensions: Vec<String>,
    #[serde(default)]
    pub ignored_paths: Vec<String>,
    #[serde(default)]
    pub only_paths: Vec<String>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.limit == Some(0) {
            return Err(ReviewersError::Config("limit must be at least 1".into()));
        }
        Ok(config)
    }

    /// Load an explicit config file, or `.reviewers.toml` under `repo_root`
    /// when it exists.
    pub fn discover(explicit: Option<&Path>, repo_root: &Path) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let candidate = repo_root.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::from_file(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Layer the file underneath `options`. File lists come first, scalars
    /// only fill in what the caller left at its default.
    pub fn apply_to(self, options: &mut ReviewerOptions, overrides: &Overrides) {
        if !overrides.base {
            if let Some(base) = self.base {
                options.base = base;
            }
        }
        if !overrides.since {
            if let Some(since) = self.since {
                options.since = since;
            }
        }
        if !overrides.limit {
            if let Some(limit) = self.limit {
                options.limit = limit;
            }
        }
        if !overrides.merge_order {
            if let Some(order) = self.merge_order {
                options.merge_order = order;
            }
        }
        if !overrides.deadline {
            if let Some(secs) = self.deadline_secs {
                options.deadline = Some(Duration::from_secs(secs));
            }
        }
        options.fail_fast |= self.fail_fast.unwrap_or(false);

        prepend(&mut options.ignored_extensions, self.filters.ignored_extensions);
        prepend(&mut options.only_extensions, self.filters.only_extensions);
        prepend(&mut options.ignored_paths, self.filters.ignored_paths);
        prepend(&mut options.only_paths, self.filters.only_paths);
    }
}

/// Which scalar options were set explicitly on the command line or via env.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub base: bool,
    pub since: bool,
    pub limit: bool,
    pub merge_order: bool,
    pub deadline: bool,
}

fn prepend(target: &mut Vec<String>, mut from_file: Vec<String>) {
    if from_file.is_empty() {
        return;
    }
    from_file.append(target);
    *target = from_file;
}
