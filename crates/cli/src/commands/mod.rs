//! CLI subcommands

pub mod baseline;
pub mod check;
pub mod init;

use anyhow::Result;
use colored::Colorize;
use stricture_core::{
    rules, AnalyzerTask, CheckConfig, CheckOptions, Findings, RuleRegistry, Scheduler, TaskError,
};
use std::path::Path;

/// Drive one full concurrent analysis: populate the registry, submit one
/// task per rule, collect. Ctrl-C trips the scheduler's cancel token; the
/// submission loop stops on the next `add_task` and whatever finished is
/// still returned.
pub(crate) fn run_analysis(
    src_dir: &Path,
    config: &CheckConfig,
    jobs: Option<usize>,
    quiet: bool,
) -> Result<(Findings, Vec<Option<TaskError>>, CheckOptions)> {
    let opts = CheckOptions::new(src_dir, config.clone());

    let mut registry = RuleRegistry::new();
    rules::register_text_rules(&mut registry, config);

    let names: Vec<String> = registry.names().iter().map(|s| s.to_string()).collect();
    let num_workers = jobs.unwrap_or(config.general.num_workers);
    let show_progress = !quiet && config.general.show_progress;

    let scheduler = Scheduler::new(num_workers, names.len(), show_progress);
    let cancel = scheduler.cancel_token();
    ctrlc::set_handler(move || cancel.cancel())?;

    for (id, name) in names.iter().enumerate() {
        let check = match registry.get(name) {
            Some(check) => check,
            None => continue,
        };
        let task = AnalyzerTask {
            id,
            srcdir: src_dir.to_path_buf(),
            rule: name.clone(),
            options: opts.clone(),
            severity_override: config.severity_override(name),
            check,
        };
        if scheduler.add_task(task).is_err() {
            eprintln!("  {}", "Interrupted — stopping submission.".yellow());
            break;
        }
    }

    let (set, errors) = scheduler.collect();
    let mut findings = set.into_findings();
    findings.sort();
    Ok((findings, errors, opts))
}
