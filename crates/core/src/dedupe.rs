//! Baseline reconciliation — suppress findings that already existed at the
//! baseline commit and are textually unchanged, even when surrounding lines
//! have shifted
//!
//! Every failure here degrades to reporting the finding: over-reporting is
//! always preferred to silently hiding an issue.

use crate::baseline::{Baseline, BaselineLocation, BaselineResult};
use crate::config::CheckOptions;
use crate::diff::{self, correlate, Hunk};
use crate::finding::{Finding, Findings, Location};
use anyhow::{bail, Context, Result};
use git2::{DiffFormat, DiffOptions, Oid, Repository, Tree};
use std::path::Path;
use std::process::Command;
use tracing::warn;

/// Reconcile the merged results of one run against the persisted baseline.
///
/// On a first run (no baseline file) the full result set becomes the new
/// baseline, keyed to HEAD, and everything is reported. On later runs each
/// finding is suppressed iff some baseline result matches its rule
/// identity, location count and path sequence, and every location pair
/// still denotes the same code across the two commits' trees. Tooling
/// failures (no git, not a repo, unreadable baseline, bad hash) fail open.
pub fn remove_duplicates(all_results: Findings, opts: &CheckOptions) -> Findings {
    if !git_usable(&opts.src_dir) {
        return all_results;
    }

    let head = match head_commit_hash(&opts.src_dir) {
        Ok(hash) => hash,
        Err(err) => {
            warn!("Cannot resolve HEAD: {:#}", err);
            return all_results;
        }
    };

    if !Baseline::path(&opts.config_dir).exists() {
        let baseline = Baseline::from_findings(all_results.iter(), &head);
        if let Err(err) = baseline.save(&opts.config_dir) {
            warn!("Cannot write baseline: {:#}", err);
        }
        return all_results;
    }

    let baseline = match Baseline::load(&opts.config_dir) {
        Ok(Some(baseline)) => baseline,
        Ok(None) => return all_results,
        Err(err) => {
            warn!("Cannot read baseline: {:#}", err);
            return all_results;
        }
    };

    let repo = match Repository::open(&opts.src_dir) {
        Ok(repo) => repo,
        Err(err) => {
            warn!("Cannot open repository {}: {}", opts.src_dir.display(), err);
            return all_results;
        }
    };
    let (baseline_tree, current_tree) =
        match lookup_trees(&repo, &baseline.commit_hash, &head) {
            Ok(trees) => trees,
            Err(err) => {
                warn!("Cannot resolve commit trees: {:#}", err);
                return all_results;
            }
        };

    let mut kept = Findings::new();
    for finding in all_results {
        let cur_locations = sorted_locations(&finding, &opts.src_dir);
        let duplicated = baseline.results.iter().any(|old| {
            let old_locations = sorted_baseline_locations(old, &opts.src_dir);
            old_locations.len() == cur_locations.len()
                && same_rule(&finding.message, &old.error_message)
                && same_paths(&cur_locations, &old_locations)
                && same_code(
                    &repo,
                    &baseline_tree,
                    &current_tree,
                    &cur_locations,
                    &old_locations,
                )
        });
        if !duplicated {
            kept.push(finding);
        }
    }
    kept
}

/// Probe for a usable git: the binary on PATH and a repository history in
/// the source dir. Both checks warn and fail open.
fn git_usable(src_dir: &Path) -> bool {
    let version_ok = Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if !version_ok {
        warn!("Cannot find git; skipping baseline filtering");
        return false;
    }

    let log_ok = Command::new("git")
        .args(["log", "-1"])
        .current_dir(src_dir)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false);
    if !log_ok {
        warn!(
            "{} is not a git repository; skipping baseline filtering",
            src_dir.display()
        );
        return false;
    }
    true
}

/// The commit hash of HEAD in `src_dir`, via the git binary.
pub fn head_commit_hash(src_dir: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(src_dir)
        .output()
        .context("running git rev-parse HEAD")?;
    if !output.status.success() {
        bail!(
            "git rev-parse HEAD: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn lookup_trees<'repo>(
    repo: &'repo Repository,
    baseline_hash: &str,
    current_hash: &str,
) -> Result<(Tree<'repo>, Tree<'repo>)> {
    let baseline_oid =
        Oid::from_str(baseline_hash).context("invalid baseline commit hash")?;
    let current_oid = Oid::from_str(current_hash).context("invalid HEAD commit hash")?;
    let baseline_tree = repo
        .find_commit(baseline_oid)
        .context("looking up baseline commit")?
        .tree()
        .context("reading baseline commit tree")?;
    let current_tree = repo
        .find_commit(current_oid)
        .context("looking up HEAD commit")?
        .tree()
        .context("reading HEAD commit tree")?;
    Ok((baseline_tree, current_tree))
}

/// Normalized (path, line) pair used for comparison: paths relative to the
/// analyzed tree, locations in canonical (path, line) order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormLocation {
    path: String,
    line: u32,
}

fn rel_str(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

fn sorted_locations(finding: &Finding, root: &Path) -> Vec<NormLocation> {
    let mut locations: Vec<NormLocation> = finding
        .locations
        .iter()
        .map(|loc: &Location| NormLocation {
            path: rel_str(&loc.path, root),
            line: loc.line,
        })
        .collect();
    locations.sort_by(|a, b| (&a.path, a.line).cmp(&(&b.path, b.line)));
    locations
}

fn sorted_baseline_locations(result: &BaselineResult, root: &Path) -> Vec<NormLocation> {
    let mut locations: Vec<NormLocation> = result
        .locations
        .iter()
        .map(|loc: &BaselineLocation| NormLocation {
            path: rel_str(Path::new(&loc.path), root),
            line: loc.line_number,
        })
        .collect();
    locations.sort_by(|a, b| (&a.path, a.line).cmp(&(&b.path, b.line)));
    locations
}

/// Rule identity: the message prefix before the first `]`, as produced by
/// the post-processor.
fn same_rule(cur_message: &str, old_message: &str) -> bool {
    cur_message.split(']').next() == old_message.split(']').next()
}

fn same_paths(cur: &[NormLocation], old: &[NormLocation]) -> bool {
    cur.iter().zip(old).all(|(c, o)| c.path == o.path)
}

/// Whether every location pair still denotes the same code between the two
/// trees. One zero-context, single-path diff per location; any diff or
/// parse failure means "cannot judge" and resolves to not-a-duplicate.
fn same_code(
    repo: &Repository,
    baseline_tree: &Tree<'_>,
    current_tree: &Tree<'_>,
    cur_locations: &[NormLocation],
    old_locations: &[NormLocation],
) -> bool {
    for (cur, old) in cur_locations.iter().zip(old_locations) {
        let hunks = match file_hunks(repo, baseline_tree, current_tree, &cur.path) {
            Ok(hunks) => hunks,
            Err(err) => {
                warn!("Cannot diff {}: {:#}", cur.path, err);
                return false;
            }
        };
        if !correlate::same_line(cur.line, old.line, &hunks) {
            return false;
        }
    }
    true
}

/// Hunks of the zero-context tree-to-tree diff restricted to one path.
/// The rendered unified text goes through the diff parser, the same code
/// path any external diff would take.
fn file_hunks(
    repo: &Repository,
    baseline_tree: &Tree<'_>,
    current_tree: &Tree<'_>,
    path: &str,
) -> Result<Vec<Hunk>> {
    let mut diff_opts = DiffOptions::new();
    diff_opts.context_lines(0);
    diff_opts.pathspec(path);
    let tree_diff = repo
        .diff_tree_to_tree(Some(baseline_tree), Some(current_tree), Some(&mut diff_opts))
        .context("diffing trees")?;

    let text = diff_text(&tree_diff).context("rendering diff")?;
    let patch = diff::parse(&text).context("parsing diff")?;
    Ok(patch.all_hunks())
}

fn diff_text(diff: &git2::Diff<'_>) -> Result<String> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        match line.origin() {
            '+' | '-' | ' ' => text.push(line.origin()),
            _ => {}
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .context("printing diff")?;
    Ok(text)
}
