#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;

pub fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

pub fn git(dir: &Path, args: &[&str]) {
    assert!(Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

pub fn init_git_repo(dir: &Path) {
    git(dir, &["init"]);
    // independent of init.defaultBranch
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "core.safecrlf", "false"]);
    git(dir, &["config", "user.email", "you@example.com"]);
    git(dir, &["config", "user.name", "Your Name"]);
}

/// Commit `content` to `name` as `author` at `date` (used for both author and
/// committer time).
pub fn commit_as(dir: &Path, author: (&str, &str), date: &str, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.sync_all().unwrap();

    commit_staged(dir, author, date, &format!("update {name}"));
}

/// Move `from` to `to` with `git mv` and commit as `author` at `date`.
pub fn rename_as(dir: &Path, author: (&str, &str), date: &str, from: &str, to: &str) {
    if let Some(parent) = dir.join(to).parent() {
        fs::create_dir_all(parent).unwrap();
    }
    git(dir, &["mv", from, to]);
    commit_staged(dir, author, date, &format!("move {from} to {to}"));
}

fn commit_staged(dir: &Path, author: (&str, &str), date: &str, message: &str) {
    git(dir, &["add", "-A"]);
    assert!(Command::new("git")
        .args(["commit", "-m", message])
        .env("GIT_AUTHOR_NAME", author.0)
        .env("GIT_AUTHOR_EMAIL", author.1)
        .env("GIT_COMMITTER_NAME", author.0)
        .env("GIT_COMMITTER_EMAIL", author.1)
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .current_dir(dir)
        .status()
        .unwrap()
        .success());
}

pub const ALICE: (&str, &str) = ("Alice", "alice@example.com");
pub const BOB: (&str, &str) = ("Bob", "bob@example.com");
pub const CAROL: (&str, &str) = ("Carol", "carol@example.com");

/// master: Carol adds README (oldest commit, so it becomes the since bound),
/// Alice edits src/a.rs twice and Carol adds assets/data.json.
/// feature: Bob edits src/a.rs once and src/b.rs twice, Bob edits
/// assets/data.json, Carol adds vendor/lib.rs.
///
/// Expected totals with default options: Bob 3, Alice 2, Carol 1.
pub fn reviewer_fixture(dir: &Path) {
    init_git_repo(dir);
    commit_as(dir, CAROL, "2020-01-01T10:00:00+00:00", "README.md", "hello\n");
    commit_as(dir, ALICE, "2020-01-02T10:00:00+00:00", "src/a.rs", "fn a() {}\n");
    commit_as(dir, ALICE, "2020-01-03T10:00:00+00:00", "src/a.rs", "fn a() { 1; }\n");
    commit_as(dir, CAROL, "2020-01-04T10:00:00+00:00", "assets/data.json", "{}\n");

    git(dir, &["checkout", "-b", "feature"]);
    commit_as(dir, BOB, "2020-02-01T10:00:00+00:00", "src/a.rs", "fn a() { 2; }\n");
    commit_as(dir, BOB, "2020-02-02T10:00:00+00:00", "src/b.rs", "fn b() {}\n");
    commit_as(dir, BOB, "2020-02-03T10:00:00+00:00", "src/b.rs", "fn b() { 1; }\n");
    commit_as(dir, BOB, "2020-02-04T10:00:00+00:00", "assets/data.json", "{\"a\":1}\n");
    commit_as(dir, CAROL, "2020-02-05T10:00:00+00:00", "vendor/lib.rs", "// v1\n");
}
