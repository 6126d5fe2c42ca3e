use crate::model::Stat;
use once_cell::sync::Lazy;
use regex::Regex;

static COUNT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s*(.*)$").expect("valid regex"));

/// Parse `git shortlog -sne` output into stats.
///
/// Lines that do not start with a commit count are skipped.
pub fn parse_shortlog(output: &str) -> Vec<Stat> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Stat> {
    let caps = COUNT_LINE.captures(line.trim())?;
    let count = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let reviewer = caps.get(2)?.as_str().trim();
    Some(Stat::new(reviewer, count))
}
