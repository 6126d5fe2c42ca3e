use crate::config::ReviewerOptions;
use crate::error::{Result, ReviewersError};
use crate::filter::FilterPolicy;
use crate::history::HistoryProvider;
use crate::merge::{Merger, PathOutcome};
use crate::model::ReviewerReport;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Finds changed files and ranks the people who have touched them most.
pub struct ReviewerFinder {
    provider: Arc<dyn HistoryProvider>,
    options: ReviewerOptions,
    policy: FilterPolicy,
}

impl ReviewerFinder {
    pub fn new(provider: Arc<dyn HistoryProvider>, options: ReviewerOptions) -> Self {
        let policy = FilterPolicy::from_options(&options);
        Self {
            provider,
            options,
            policy,
        }
    }

    pub fn options(&self) -> &ReviewerOptions {
        &self.options
    }

    /// Paths changed between the base and head revisions that pass the
    /// filter policy, in the provider's diff order.
    pub fn find_files(&self) -> Result<Vec<String>> {
        let changed = self
            .provider
            .diff_changed_paths(&self.options.base, &self.options.head)?;

        let files: Vec<String> = changed
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && self.policy.should_consider(line))
            .map(String::from)
            .collect();

        debug!(
            changed = changed.len(),
            considered = files.len(),
            base = %self.options.base,
            head = %self.options.head,
            "filtered changed files"
        );
        Ok(files)
    }

    /// Commit time tokens of the base and head revisions.
    pub fn branch_timestamps(&self) -> Result<(String, String)> {
        let base = self.provider.timestamp_of(&self.options.base)?;
        let head = self.provider.timestamp_of(&self.options.head)?;
        Ok((base, head))
    }

    /// Query the history of every path concurrently and merge the results
    /// into one ranking.
    ///
    /// A failing path does not abort the search unless `fail_fast` is set; it
    /// is listed in [`ReviewerReport::failed`] instead.
    pub async fn find_reviewers(&self, paths: &[String]) -> Result<ReviewerReport> {
        if paths.is_empty() {
            return Ok(ReviewerReport::default());
        }

        let provider = Arc::clone(&self.provider);
        let since = self.options.since.clone();
        let bound = tokio::task::spawn_blocking(move || provider.resolve_since_bound(&since))
            .await
            .map_err(|e| ReviewersError::Provider(format!("since bound task failed: {e}")))??;

        let (tx, mut rx) = mpsc::channel::<PathOutcome>(paths.len());
        for (index, path) in paths.iter().enumerate() {
            let tx = tx.clone();
            let provider = Arc::clone(&self.provider);
            let bound = bound.clone();
            let path = path.clone();

            tokio::task::spawn_blocking(move || {
                let started = Instant::now();
                let result = provider
                    .authorship_counts(&path, &bound)
                    .map_err(|e| e.for_path(&path));
                debug!(
                    path = %path,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = result.is_ok(),
                    "history query finished"
                );
                // send fails only once the receiver has stopped waiting
                let _ = tx.blocking_send(PathOutcome {
                    index,
                    path,
                    result,
                });
            });
        }
        drop(tx);

        let progress = self.progress_bar(paths.len());
        let mut merger = Merger::new(self.options.merge_order, paths);
        let fail_fast = self.options.fail_fast;

        let drain = async {
            while let Some(outcome) = rx.recv().await {
                progress.inc(1);
                match outcome.result {
                    Err(err) if fail_fast => return Err(err),
                    result => merger.accept(PathOutcome {
                        index: outcome.index,
                        path: outcome.path,
                        result,
                    }),
                }
            }
            Ok::<(), ReviewersError>(())
        };

        let drained = match self.options.deadline {
            Some(limit) => tokio::time::timeout(limit, drain).await.ok(),
            None => Some(drain.await),
        };
        progress.finish_and_clear();

        let abandoned = match drained {
            Some(result) => {
                result?;
                false
            }
            None => {
                warn!(
                    received = merger.received(),
                    total = paths.len(),
                    "deadline expired before all file histories were read"
                );
                true
            }
        };

        let summary = merger.finish(abandoned);
        info!(
            files = paths.len(),
            reviewers = summary.stats.len(),
            failed = summary.failed.len(),
            unfinished = summary.unfinished.len(),
            "merged file histories"
        );

        Ok(ReviewerReport {
            reviewers: summary.stats.top(self.options.limit),
            failed: summary.failed,
            unfinished: summary.unfinished,
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.options.progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Reading file history...");
        pb
    }
}
