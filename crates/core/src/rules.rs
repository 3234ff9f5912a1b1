//! Built-in text rule family — regex checks over raw source lines
//!
//! Project-specific conventions (banned tokens, formatting rules) are
//! declared in `.stricture.toml` and registered under `text/<id>`. The
//! heavyweight rule families wrap external checker backends and register
//! themselves the same way.

use crate::config::{CheckConfig, CheckOptions, TextRule};
use crate::finding::{Finding, FindingSet, Findings, Severity};
use crate::registry::RuleRegistry;
use anyhow::{Context, Result};
use glob::Pattern;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Extensions checked when a rule declares no path globs.
const SOURCE_EXTENSIONS: &[&str] = &[".c", ".h", ".cc", ".cpp", ".cxx", ".hpp", ".hh"];

/// One compiled text rule ready for matching.
pub struct TextRuleCheck {
    regex: Regex,
    globs: Vec<Pattern>,
    severity: Severity,
    message: String,
}

impl TextRuleCheck {
    pub fn compile(rule: &TextRule) -> Result<Self> {
        let regex = Regex::new(&rule.pattern)
            .with_context(|| format!("invalid regex in text rule '{}'", rule.id))?;

        let mut globs = Vec::new();
        for pattern in &rule.paths {
            let glob = Pattern::new(pattern).with_context(|| {
                format!("invalid glob '{}' in text rule '{}'", pattern, rule.id)
            })?;
            globs.push(glob);
        }

        let severity = match Severity::from_name(&rule.severity) {
            Some(severity) => severity,
            None => {
                warn!(
                    "Unknown severity '{}' in text rule '{}', defaulting to warning",
                    rule.severity, rule.id
                );
                Severity::Warning
            }
        };

        Ok(TextRuleCheck {
            regex,
            globs,
            severity,
            message: rule.message.clone(),
        })
    }

    /// With no globs a rule applies to all C/C++ sources.
    fn file_matches(&self, file_name: &str) -> bool {
        if self.globs.is_empty() {
            return SOURCE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext));
        }
        self.globs.iter().any(|glob| glob.matches(file_name))
    }
}

impl crate::registry::Analyze for TextRuleCheck {
    fn analyze(&self, srcdir: &Path, _opts: &CheckOptions) -> Result<Findings> {
        // Raw multi-line matching can hit the same (file, line) more than
        // once; the set keeps the output pre-deduplicated.
        let mut findings = FindingSet::new();

        for file in discover_files(srcdir)? {
            let file_name = match file.file_name().and_then(|name| name.to_str()) {
                Some(name) => name,
                None => continue,
            };
            if !self.file_matches(file_name) {
                continue;
            }

            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(_) => continue, // binary or unreadable
            };

            for (idx, line) in content.lines().enumerate() {
                if self.regex.is_match(line) {
                    findings.add(
                        Finding::new(file.clone(), (idx + 1) as u32, self.message.clone())
                            .with_severity(self.severity),
                    );
                }
            }
        }

        Ok(findings.into_findings())
    }
}

/// Discover candidate source files under `root`, gitignore-aware.
/// Returns absolute paths sorted alphabetically.
pub fn discover_files(root: &Path) -> Result<Vec<PathBuf>> {
    let root = root
        .canonicalize()
        .with_context(|| format!("resolving {}", root.display()))?;

    let mut builder = WalkBuilder::new(&root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue, // skip unreadable entries
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.into_path();
        if path.is_absolute() {
            files.push(path);
        } else {
            files.push(root.join(path));
        }
    }

    files.sort();
    Ok(files)
}

/// Register every configured text rule under `text/<id>`. Rules that fail
/// to compile are skipped with a warning; they must not take down startup.
pub fn register_text_rules(registry: &mut RuleRegistry, config: &CheckConfig) {
    for rule in &config.rules {
        match TextRuleCheck::compile(rule) {
            Ok(check) => registry.register(format!("text/{}", rule.id), Arc::new(check)),
            Err(err) => warn!("Skipping text rule '{}': {:#}", rule.id, err),
        }
    }
}
