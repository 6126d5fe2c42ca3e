use crate::config::ReviewerOptions;
use crate::model::{ReviewerReport, ReviewersOutput, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;
use std::path::Path;

pub fn output_json(
    report: &ReviewerReport,
    files: &[String],
    options: &ReviewerOptions,
    repo_path: &Path,
) -> Result<()> {
    let output = ReviewersOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        repository_path: repo_path.to_string_lossy().to_string(),
        base: options.base.clone(),
        head: options.head.clone(),
        since: options.since.clone(),
        files: files.to_vec(),
        reviewers: report.reviewers.clone(),
        failed_paths: report.failed.clone(),
        unfinished_paths: report.unfinished.clone(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn output_text(report: &ReviewerReport, files: &[String], options: &ReviewerOptions) -> Result<()> {
    if options.show_files {
        println!("{}", style("Files:").bold());
        for file in files {
            println!("  {file}");
        }
        println!();
        println!("{}", style("Reviewers:").bold());
    }

    for line in report.lines() {
        println!("{line}");
    }

    for failed in &report.failed {
        eprintln!(
            "{} could not read history of {}: {}",
            style("warning:").yellow().bold(),
            failed.path,
            failed.error
        );
    }
    if !report.unfinished.is_empty() {
        eprintln!(
            "{} deadline expired, {} file(s) not counted: {}",
            style("warning:").yellow().bold(),
            report.unfinished.len(),
            report.unfinished.join(", ")
        );
    }

    Ok(())
}
