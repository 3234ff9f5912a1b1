//! Baseline command — snapshot current findings so future runs only
//! report new ones, or clear the stored snapshot

use anyhow::{Context, Result};
use colored::Colorize;
use stricture_core::{dedupe, Baseline, CheckConfig, CheckOptions};
use std::path::Path;
use std::time::Instant;

pub fn run(path: Option<&Path>, clear: bool, cli: &crate::Cli) -> Result<()> {
    let src_dir = path.unwrap_or_else(|| Path::new("."));
    let src_dir = std::fs::canonicalize(src_dir).unwrap_or_else(|_| src_dir.to_path_buf());

    if clear {
        let config = CheckConfig::find_and_load(&src_dir)?;
        let opts = CheckOptions::new(&src_dir, config);
        let removed = Baseline::clear(&opts.config_dir)?;
        if removed {
            eprintln!("  {}", "Baseline cleared.".green());
        } else {
            eprintln!("  {}", "No baseline to clear.".dimmed());
        }
        return Ok(());
    }

    let start = Instant::now();
    eprintln!(
        "{}",
        format!("  stricture v{} — creating baseline", stricture_core::VERSION).bold()
    );
    eprintln!();

    let config = CheckConfig::find_and_load(&src_dir)?;
    let (findings, _errors, opts) = super::run_analysis(&src_dir, &config, cli.jobs, cli.quiet)?;

    // Snapshotting only makes sense against a commit; unlike the check
    // command this one is explicit, so a missing repo is a hard error.
    let commit = dedupe::head_commit_hash(&src_dir)
        .context("baseline requires a git repository with at least one commit")?;

    let baseline = Baseline::from_findings(findings.iter(), &commit);
    baseline.save(&opts.config_dir)?;

    eprintln!();
    eprintln!(
        "  {} at commit {}",
        format!("Baselined {} finding(s)", findings.len())
            .green()
            .bold(),
        &commit[..commit.len().min(12)],
    );
    eprintln!("  Time: {:.1}s", start.elapsed().as_secs_f64());

    Ok(())
}
