//! Check command — run all configured rules, reconcile against the
//! baseline in incremental mode, print a severity-bucketed report

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use stricture_core::{remove_duplicates, CheckConfig, Findings, Severity};
use std::path::Path;
use std::time::{Duration, Instant};

/// Returns whether the findings exceed the configured fail threshold.
pub fn run(path: Option<&Path>, cli: &crate::Cli) -> Result<bool> {
    let src_dir = path.unwrap_or_else(|| Path::new("."));
    let src_dir = std::fs::canonicalize(src_dir).unwrap_or_else(|_| src_dir.to_path_buf());
    let start = Instant::now();

    eprintln!(
        "{}",
        format!("  stricture v{} — check", stricture_core::VERSION).bold()
    );
    eprintln!();

    // ── 1. Config ────────────────────────────────────────────────
    let config = CheckConfig::find_and_load(&src_dir)?;

    // ── 2. Concurrent analysis ───────────────────────────────────
    let (mut findings, errors, opts) =
        super::run_analysis(&src_dir, &config, cli.jobs, cli.quiet)?;

    if errors.is_empty() && findings.is_empty() {
        eprintln!("  {}", "No rules configured — nothing to check.".dimmed());
        return Ok(false);
    }

    // ── 3. Baseline reconciliation ───────────────────────────────
    if config.baseline.enabled && !cli.no_baseline {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("  {spinner:.green} {msg}")
                .unwrap(),
        );
        spinner.set_message("Reconciling against baseline...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let before = findings.len();
        findings = remove_duplicates(findings, &opts);
        spinner.finish_and_clear();

        eprintln!(
            "  Reconciling against baseline... {} ({} reported, {} suppressed)",
            "done".green(),
            findings.len(),
            before - findings.len()
        );
    }

    // ── 4. Report ────────────────────────────────────────────────
    eprintln!();
    for finding in findings.iter() {
        let severity = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow(),
            Severity::Info => "info".blue(),
        };
        let rel = finding.path.strip_prefix(&src_dir).unwrap_or(&finding.path);
        println!("  {}:{} {} {}", rel.display(), finding.line, severity, finding.message);
    }

    let rule_errors: Vec<_> = errors.iter().flatten().collect();
    for err in &rule_errors {
        println!("  {} {}", "rule error:".red(), err);
    }

    let (error_count, warning_count, info_count) = count_by_severity(&findings);
    eprintln!();
    eprintln!(
        "  {} ({} errors, {} warnings, {} info), {} rule error(s)",
        format!("{} finding(s)", findings.len()).bold(),
        error_count,
        warning_count,
        info_count,
        rule_errors.len(),
    );
    eprintln!("  Time: {:.1}s", start.elapsed().as_secs_f64());

    Ok(exceeds_threshold(
        error_count,
        warning_count,
        info_count,
        &config.general.fail_on,
    ))
}

fn count_by_severity(findings: &Findings) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    for finding in findings.iter() {
        match finding.severity {
            Severity::Error => counts.0 += 1,
            Severity::Warning => counts.1 += 1,
            Severity::Info => counts.2 += 1,
        }
    }
    counts
}

/// - `"error"` → fail if errors > 0
/// - `"warning"` → fail if errors or warnings > 0
/// - `"info"` → fail if any findings
/// - `"never"` → always pass
fn exceeds_threshold(errors: usize, warnings: usize, info: usize, fail_on: &str) -> bool {
    match fail_on {
        "error" => errors > 0,
        "warning" => errors > 0 || warnings > 0,
        "info" => errors > 0 || warnings > 0 || info > 0,
        "never" => false,
        _ => errors > 0, // default to "error" for unknown values
    }
}
