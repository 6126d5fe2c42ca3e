use crate::config::{FileConfig, MergeOrder, Overrides, ReviewerOptions};
use crate::finder::ReviewerFinder;
use crate::history::{GitCommandHistory, GixHistory, HistoryProvider};
use crate::output::{output_json, output_text};
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use console::Term;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "git-reviewers")]
#[command(about = "Suggest reviewers for the files changed on the current branch")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, help = "Path to config file (default: .reviewers.toml in the repository)")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Backend::Gix, help = "How to read repository history")]
    pub backend: Backend,

    #[arg(long, env = "GIT_REVIEWERS_BASE", help = "Baseline reference to diff against [default: master]")]
    pub base: Option<String>,

    #[arg(long, default_value = "HEAD", help = "Revision holding the changes")]
    pub head: String,

    #[arg(
        long,
        env = "GIT_REVIEWERS_SINCE",
        help = "Only count commits from this date on (YYYY-MM-DD, RFC3339, '3 months ago', or a commit) [default: 2015-01-01]"
    )]
    pub since: Option<String>,

    #[arg(short = 'i', long = "ignore-ext", value_delimiter = ',', help = "Ignore files ending with these extensions")]
    pub ignore_ext: Vec<String>,

    #[arg(short = 'o', long = "only-ext", value_delimiter = ',', help = "Only consider files ending with these extensions")]
    pub only_ext: Vec<String>,

    #[arg(short = 'I', long = "ignore-path", value_delimiter = ',', help = "Ignore files under these path prefixes")]
    pub ignore_path: Vec<String>,

    #[arg(short = 'O', long = "only-path", value_delimiter = ',', help = "Only consider files under these path prefixes")]
    pub only_path: Vec<String>,

    #[arg(long, help = "Number of reviewers to suggest [default: 3]")]
    pub limit: Option<usize>,

    #[arg(long, value_enum, help = "Order in which file histories are merged [default: input]")]
    pub merge_order: Option<MergeOrder>,

    #[arg(long, help = "Fail when any file history cannot be read")]
    pub fail_fast: bool,

    #[arg(long, value_name = "SECS", help = "Stop waiting for file histories after this many seconds")]
    pub deadline: Option<u64>,

    #[arg(short = 'f', long, help = "List the files that were considered")]
    pub show_files: bool,

    #[arg(short, long, help = "Log progress details to stderr")]
    pub verbose: bool,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Read history in-process with gix
    Gix,
    /// Run the git binary
    Git,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let result = runtime.block_on(self.execute());
        // queries left behind by an expired deadline are not waited for
        runtime.shutdown_background();
        result
    }

    pub async fn execute(self) -> Result<()> {
        let (provider, repo_path) = self.open_provider()?;

        let file_config = FileConfig::discover(self.config.as_deref(), &repo_path)
            .context("Failed to load configuration")?;
        let options = self.options(file_config)?;
        let json = self.json;

        let finder = ReviewerFinder::new(provider, options);

        if finder.options().verbose {
            match finder.branch_timestamps() {
                Ok((base, head)) => debug!(base = %base, head = %head, "branch commit times"),
                Err(e) => debug!(error = %e, "could not read branch commit times"),
            }
        }

        let files = finder
            .find_files()
            .context("Failed to list changed files")?;
        let report = finder
            .find_reviewers(&files)
            .await
            .context("Failed to find reviewers")?;

        if json {
            output_json(&report, &files, finder.options(), &repo_path)?;
        } else {
            output_text(&report, &files, finder.options())?;
        }

        Ok(())
    }

    fn open_provider(&self) -> Result<(Arc<dyn HistoryProvider>, PathBuf)> {
        match self.backend {
            Backend::Gix => {
                let history = GixHistory::open(self.repo.as_ref())
                    .context("Failed to open git repository")?;
                let path = history.path().to_path_buf();
                Ok((Arc::new(history), path))
            }
            Backend::Git => {
                let history = GitCommandHistory::open(self.repo.as_ref())
                    .context("Failed to open git repository")?;
                let path = history.path().to_path_buf();
                Ok((Arc::new(history), path))
            }
        }
    }

    fn options(&self, file_config: FileConfig) -> Result<ReviewerOptions> {
        if self.limit == Some(0) {
            bail!("--limit must be at least 1");
        }

        let defaults = ReviewerOptions::default();
        let mut options = ReviewerOptions {
            show_files: self.show_files,
            verbose: self.verbose,
            since: self.since.clone().unwrap_or(defaults.since),
            ignored_extensions: self.ignore_ext.clone(),
            only_extensions: self.only_ext.clone(),
            ignored_paths: self.ignore_path.clone(),
            only_paths: self.only_path.clone(),
            base: self.base.clone().unwrap_or(defaults.base),
            head: self.head.clone(),
            limit: self.limit.unwrap_or(defaults.limit),
            merge_order: self.merge_order.unwrap_or(defaults.merge_order),
            fail_fast: self.fail_fast,
            deadline: self.deadline.map(Duration::from_secs),
            progress: !self.json && Term::stderr().is_term(),
        };

        let overrides = Overrides {
            base: self.base.is_some(),
            since: self.since.is_some(),
            limit: self.limit.is_some(),
            merge_order: self.merge_order.is_some(),
            deadline: self.deadline.is_some(),
        };
        file_config.apply_to(&mut options, &overrides);

        Ok(options)
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "git_reviewers=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
