//! Configuration file parsing for .stricture.toml, plus the runtime
//! options handed to every rule check

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".stricture.toml";

/// Directory (relative to the analyzed tree) holding the baseline and other
/// per-project state.
pub const DEFAULT_CONFIG_DIR: &str = ".stricture";

/// A user-defined regex-based text rule in `.stricture.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextRule {
    /// Rule name within the text family (e.g. "no_goto")
    pub id: String,

    /// Regex pattern (Rust `regex` crate syntax)
    pub pattern: String,

    /// Message reported when the pattern matches
    pub message: String,

    /// Severity: "error", "warning", or "info"
    #[serde(default = "default_warning")]
    pub severity: String,

    /// Glob patterns for file matching (e.g., `["*.c", "*.h"]`)
    #[serde(default)]
    pub paths: Vec<String>,
}

fn default_warning() -> String {
    "warning".to_string()
}

/// Main configuration structure for .stricture.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub baseline: BaselineConfig,

    /// Per-rule severity overrides: full rule name → severity name
    /// (e.g. `"text/no_goto" = "error"`)
    #[serde(default)]
    pub severity: HashMap<String, String>,

    /// User-defined text rules
    #[serde(default, rename = "rules")]
    pub rules: Vec<TextRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Worker threads for the scheduler (0 = available CPU count)
    #[serde(default)]
    pub num_workers: usize,

    /// Emit per-rule progress lines while checking
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Severity threshold for a non-zero exit code
    #[serde(default = "default_fail_on")]
    pub fail_on: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            num_workers: 0,
            show_progress: true,
            fail_on: default_fail_on(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Suppress findings already present in the baseline on reruns
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding baseline.json, relative to the analyzed tree
    #[serde(default = "default_config_dir")]
    pub dir: String,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        BaselineConfig {
            enabled: true,
            dir: default_config_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_fail_on() -> String {
    "error".to_string()
}

fn default_config_dir() -> String {
    DEFAULT_CONFIG_DIR.to_string()
}

impl CheckConfig {
    /// Load config from a specific file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: CheckConfig =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Look for `.stricture.toml` in `dir` and its ancestors; fall back to
    /// defaults when none is found.
    pub fn find_and_load(dir: &Path) -> Result<Self> {
        let mut current = Some(dir);
        while let Some(d) = current {
            let candidate = d.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::load(&candidate);
            }
            current = d.parent();
        }
        Ok(CheckConfig::default())
    }

    /// Severity override for a fully-qualified rule name, if configured.
    pub fn severity_override(&self, rule: &str) -> Option<crate::finding::Severity> {
        self.severity
            .get(rule)
            .and_then(|name| crate::finding::Severity::from_name(name))
    }
}

/// Runtime options handed to every rule check and to the deduplicator.
/// Owned by each task once submitted.
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Root of the source tree being analyzed
    pub src_dir: PathBuf,

    /// Directory holding baseline.json and other per-project state
    pub config_dir: PathBuf,

    /// Whether a rule may emit its own progress output. The scheduler
    /// clears this while a rule runs under the pool so nested runners
    /// don't interleave progress lines.
    pub check_progress: bool,

    pub config: CheckConfig,
}

impl CheckOptions {
    pub fn new(src_dir: impl Into<PathBuf>, config: CheckConfig) -> Self {
        let src_dir = src_dir.into();
        let config_dir = src_dir.join(&config.baseline.dir);
        CheckOptions {
            src_dir,
            config_dir,
            check_progress: true,
            config,
        }
    }
}
