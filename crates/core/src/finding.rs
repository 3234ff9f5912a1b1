//! Finding types — one reported rule violation, plus the ordered and
//! deduplicating containers the engine aggregates into

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Severity level of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Parse a severity name as written in config (`"error"`, `"warning"`, `"info"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" => Some(Severity::Warning),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// What kind of report a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FindingKind {
    /// A coding-standard violation
    #[default]
    Violation,
    /// Supplementary information attached to another report
    Note,
}

/// One (path, line) position. Multi-location findings carry several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub line: u32,
}

/// A single finding from one rule check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// File where the violation was detected
    pub path: PathBuf,

    /// Line number in the file (1-indexed)
    pub line: u32,

    /// Human-readable message; the post-processor prefixes it with the
    /// rule identity exactly once
    pub message: String,

    /// Rule name within its ruleset (e.g. "rule_no_goto")
    pub rule_id: String,

    /// Ruleset / rule family (e.g. "text")
    pub ruleset: String,

    pub severity: Severity,

    pub kind: FindingKind,

    /// All positions this finding refers to, in report order.
    /// Always contains at least the primary (path, line).
    pub locations: Vec<Location>,
}

impl Finding {
    /// Create a finding at a single location with default severity.
    pub fn new(path: impl Into<PathBuf>, line: u32, message: impl Into<String>) -> Self {
        let path = path.into();
        Finding {
            locations: vec![Location {
                path: path.clone(),
                line,
            }],
            path,
            line,
            message: message.into(),
            rule_id: String::new(),
            ruleset: String::new(),
            severity: Severity::Warning,
            kind: FindingKind::Violation,
        }
    }

    /// Replace the location list (for multi-location findings).
    pub fn with_locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Run-local identity: two findings with the same path, line and
    /// message are the same finding.
    fn key(&self) -> FindingKey {
        FindingKey {
            path: self.path.clone(),
            line: self.line,
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FindingKey {
    path: PathBuf,
    line: u32,
    message: String,
}

/// Ordered, non-unique sequence of findings. Insertion order is discovery
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Findings(Vec<Finding>);

impl Findings {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, finding: Finding) {
        self.0.push(finding);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Finding>) {
        self.0.extend(other);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Finding> {
        self.0.iter_mut()
    }

    pub fn as_slice(&self) -> &[Finding] {
        &self.0
    }

    /// Deterministic report order: path, then line, then message.
    pub fn sort(&mut self) {
        self.0
            .sort_by(|a, b| (&a.path, a.line, &a.message).cmp(&(&b.path, b.line, &b.message)));
    }
}

impl From<Vec<Finding>> for Findings {
    fn from(findings: Vec<Finding>) -> Self {
        Self(findings)
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Findings {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Finding> for Findings {
    fn from_iter<I: IntoIterator<Item = Finding>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A findings list that guarantees uniqueness by (path, line, message).
///
/// Wraps an ordered [`Findings`] list and an auxiliary key set; `add` keeps
/// the first-seen entry and drops duplicates silently. Rule implementations
/// use this to pre-deduplicate raw multi-tool output; it is unrelated to the
/// baseline's notion of identity.
#[derive(Debug, Clone, Default)]
pub struct FindingSet {
    list: Findings,
    seen: HashSet<FindingKey>,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finding unless an identical one is already present.
    /// Returns whether the finding was inserted.
    pub fn add(&mut self, finding: Finding) -> bool {
        if self.seen.insert(finding.key()) {
            self.list.push(finding);
            true
        } else {
            false
        }
    }

    /// Fold [`FindingSet::add`] over a list.
    pub fn add_all(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.add(finding);
        }
    }

    pub fn contains(&self, finding: &Finding) -> bool {
        self.seen.contains(&finding.key())
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.list.iter()
    }

    /// Consume the set, keeping only the ordered list.
    pub fn into_findings(self) -> Findings {
        self.list
    }
}
