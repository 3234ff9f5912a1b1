//! Rule registry — maps rule names to their analyze capabilities
//!
//! Rule families register themselves at startup; the scheduler only ever
//! sees the [`Analyze`] contract.

use crate::config::CheckOptions;
use crate::finding::Findings;
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// The one contract the scheduler requires of a rule check.
pub trait Analyze: Send + Sync {
    fn analyze(&self, srcdir: &Path, opts: &CheckOptions) -> Result<Findings>;
}

impl<F> Analyze for F
where
    F: Fn(&Path, &CheckOptions) -> Result<Findings> + Send + Sync,
{
    fn analyze(&self, srcdir: &Path, opts: &CheckOptions) -> Result<Findings> {
        self(srcdir, opts)
    }
}

/// Registry of rule checks by fully-qualified name (`family/rule`).
#[derive(Default)]
pub struct RuleRegistry {
    checks: HashMap<String, Arc<dyn Analyze>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under a rule name. A later registration under the
    /// same name replaces the earlier one.
    pub fn register(&mut self, name: impl Into<String>, check: Arc<dyn Analyze>) {
        self.checks.insert(name.into(), check);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Analyze>> {
        self.checks.get(name).cloned()
    }

    /// Registered rule names in deterministic (sorted) order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
