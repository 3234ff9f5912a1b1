use git2::{IndexAddOption, Repository, Signature};
use std::path::Path;
use std::process::Command;
use stricture_core::{remove_duplicates, Baseline, CheckConfig, CheckOptions, Finding, Findings};
use tempfile::TempDir;

fn git_on_path() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("tester", "tester@example.com").unwrap();
    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.target())
        .map(|oid| repo.find_commit(oid).unwrap());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

fn options(dir: &Path) -> CheckOptions {
    CheckOptions::new(dir, CheckConfig::default())
}

fn finding(dir: &Path, line: u32, message: &str) -> Finding {
    Finding::new(dir.join("src.c"), line, message)
}

const GOTO_MSG: &str = "[NO_GOTO][text-no_goto]: goto used";

#[test]
fn test_first_run_creates_baseline_and_reports_all() {
    if !git_on_path() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("src.c"), "int a;\nint b;\ngoto fail;\nint d;\n").unwrap();
    let repo = Repository::init(dir).unwrap();
    let head = commit_all(&repo, "initial");

    let opts = options(dir);
    let mut results = Findings::new();
    results.push(finding(dir, 3, GOTO_MSG));

    let reported = remove_duplicates(results, &opts);
    assert_eq!(reported.len(), 1);

    let baseline = Baseline::load(&opts.config_dir)
        .unwrap()
        .expect("first run writes a baseline");
    assert_eq!(baseline.commit_hash, head.to_string());
    assert_eq!(baseline.results.len(), 1);
    assert_eq!(baseline.results[0].error_message, GOTO_MSG);
}

#[test]
fn test_unchanged_rerun_suppresses_everything() {
    if !git_on_path() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("src.c"), "int a;\nint b;\ngoto fail;\nint d;\n").unwrap();
    let repo = Repository::init(dir).unwrap();
    let head = commit_all(&repo, "initial");

    let opts = options(dir);
    let mut results = Findings::new();
    results.push(finding(dir, 3, GOTO_MSG));

    // first run seeds the baseline
    let reported = remove_duplicates(results.clone(), &opts);
    assert_eq!(reported.len(), 1);

    // second run, repo unmodified: everything is a duplicate
    let reported = remove_duplicates(results, &opts);
    assert!(reported.is_empty());

    // a successful incremental run never refreshes the baseline
    let baseline = Baseline::load(&opts.config_dir).unwrap().unwrap();
    assert_eq!(baseline.commit_hash, head.to_string());
}

#[test]
fn test_shifted_finding_is_still_suppressed() {
    if !git_on_path() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("src.c"), "int a;\nint b;\ngoto fail;\nint d;\n").unwrap();
    let repo = Repository::init(dir).unwrap();
    commit_all(&repo, "initial");

    let opts = options(dir);
    let mut results = Findings::new();
    results.push(finding(dir, 3, GOTO_MSG));
    remove_duplicates(results, &opts);

    // an unrelated line lands above the finding; its line number shifts
    std::fs::write(
        dir.join("src.c"),
        "#include <stdio.h>\nint a;\nint b;\ngoto fail;\nint d;\n",
    )
    .unwrap();
    commit_all(&repo, "prepend include");

    let mut shifted = Findings::new();
    shifted.push(finding(dir, 4, GOTO_MSG));

    let reported = remove_duplicates(shifted, &opts);
    assert!(reported.is_empty(), "offset-adjusted finding must stay suppressed");
}

#[test]
fn test_novel_finding_is_reported_next_to_suppressed_one() {
    if !git_on_path() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("src.c"), "int a;\nint b;\ngoto fail;\nint d;\n").unwrap();
    let repo = Repository::init(dir).unwrap();
    commit_all(&repo, "initial");

    let opts = options(dir);
    let mut results = Findings::new();
    results.push(finding(dir, 3, GOTO_MSG));
    remove_duplicates(results, &opts);

    let mut rerun = Findings::new();
    rerun.push(finding(dir, 3, GOTO_MSG));
    rerun.push(finding(dir, 2, "[NO_SHORT_NAME][text-no_short_name]: name too short"));

    let reported = remove_duplicates(rerun, &opts);
    assert_eq!(reported.len(), 1);
    assert!(reported.iter().next().unwrap().message.contains("NO_SHORT_NAME"));
}

#[test]
fn test_edited_line_is_reported_again() {
    if !git_on_path() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("src.c"), "int a;\nint b;\ngoto fail;\nint d;\n").unwrap();
    let repo = Repository::init(dir).unwrap();
    commit_all(&repo, "initial");

    let opts = options(dir);
    let mut results = Findings::new();
    results.push(finding(dir, 3, GOTO_MSG));
    remove_duplicates(results, &opts);

    // the offending line itself changes; the old finding no longer counts
    std::fs::write(dir.join("src.c"), "int a;\nint b;\ngoto err;\nint d;\n").unwrap();
    commit_all(&repo, "edit goto line");

    let mut rerun = Findings::new();
    rerun.push(finding(dir, 3, GOTO_MSG));

    let reported = remove_duplicates(rerun, &opts);
    assert_eq!(reported.len(), 1);
}

#[test]
fn test_location_count_mismatch_is_not_a_duplicate() {
    if !git_on_path() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("src.c"), "int a;\nint b;\ngoto fail;\nint d;\n").unwrap();
    let repo = Repository::init(dir).unwrap();
    commit_all(&repo, "initial");

    let opts = options(dir);
    let mut results = Findings::new();
    results.push(finding(dir, 3, GOTO_MSG));
    remove_duplicates(results, &opts);

    // same rule and primary position but two locations now
    let mut rerun = Findings::new();
    rerun.push(finding(dir, 3, GOTO_MSG).with_locations(vec![
        stricture_core::Location {
            path: dir.join("src.c"),
            line: 3,
        },
        stricture_core::Location {
            path: dir.join("src.c"),
            line: 4,
        },
    ]));

    let reported = remove_duplicates(rerun, &opts);
    assert_eq!(reported.len(), 1);
}

#[test]
fn test_outside_a_repository_fails_open() {
    if !git_on_path() {
        eprintln!("git not found, skipping");
        return;
    }
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();

    let opts = options(dir);
    let mut results = Findings::new();
    results.push(finding(dir, 3, GOTO_MSG));

    let reported = remove_duplicates(results, &opts);
    assert_eq!(reported.len(), 1);
    // no filtering also means no baseline gets written
    assert!(Baseline::load(&opts.config_dir).unwrap().is_none());
}
