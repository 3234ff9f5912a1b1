//! Per-task result shaping, run by the collector as each task completes
//!
//! Prefixes every message with the rule identity, fills the ruleset/rule_id
//! fields and applies a configured severity override. This is the single
//! mutation findings receive; afterwards they are effectively immutable.

use crate::scheduler::AnalyzerResult;

/// Shape one completed task's findings in place.
///
/// A rule named `text/no_goto` turns a raw message `goto used` into
/// `[NO_GOTO][text-no_goto]: goto used`. The bracketed prefix before the
/// first `]` doubles as the rule identity the baseline deduplicator keys on.
pub fn apply(result: &mut AnalyzerResult) {
    let (family, rule) = split_rule_name(&result.rule);
    let prefix = format!("[{}][{}-{}]: ", rule.to_uppercase(), family, rule);

    for finding in result.findings.iter_mut() {
        finding.message = format!("{}{}", prefix, finding.message);
        finding.ruleset = family.to_string();
        finding.rule_id = rule.to_string();
        if let Some(severity) = result.severity_override {
            finding.severity = severity;
        }
    }
}

/// `family/rule` → (family, rule). A bare name is its own family.
fn split_rule_name(name: &str) -> (&str, &str) {
    match name.split_once('/') {
        Some((family, rule)) => (family, rule),
        None => (name, name),
    }
}
