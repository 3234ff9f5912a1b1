//! Baseline snapshot — findings persisted against a commit so reruns can
//! suppress what already existed

use crate::finding::Finding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const BASELINE_FILE: &str = "baseline.json";

/// One position of a baselined finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineLocation {
    pub path: String,
    pub line_number: u32,
}

/// One baselined finding: the post-processed message (its `[...]` prefix is
/// the rule identity), the primary line and every location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineResult {
    pub error_message: String,
    pub line_number: u32,
    #[serde(default)]
    pub locations: Vec<BaselineLocation>,
}

/// The persisted document: all results of one run, keyed to the commit the
/// run analyzed. Loaded once per run; rewritten only when no baseline
/// exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub results: Vec<BaselineResult>,
    pub commit_hash: String,
}

impl Baseline {
    /// Snapshot a finding sequence against a commit hash.
    pub fn from_findings<'a>(
        findings: impl IntoIterator<Item = &'a Finding>,
        commit_hash: impl Into<String>,
    ) -> Self {
        let results = findings
            .into_iter()
            .map(|f| BaselineResult {
                error_message: f.message.clone(),
                line_number: f.line,
                locations: f
                    .locations
                    .iter()
                    .map(|loc| BaselineLocation {
                        path: loc.path.to_string_lossy().into_owned(),
                        line_number: loc.line,
                    })
                    .collect(),
            })
            .collect();

        Baseline {
            results,
            commit_hash: commit_hash.into(),
        }
    }

    /// Path of the baseline file under a config directory.
    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(BASELINE_FILE)
    }

    /// Write the baseline to `<config_dir>/baseline.json`.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir)
            .with_context(|| format!("creating config dir {}", config_dir.display()))?;
        let path = Self::path(config_dir);
        let json = serde_json::to_string_pretty(self).context("serializing baseline")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Load the baseline, returning `None` if the file doesn't exist.
    pub fn load(config_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(config_dir);
        if !path.exists() {
            return Ok(None);
        }
        let data =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let baseline: Baseline =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(baseline))
    }

    /// Delete the baseline file. Returns `true` if a file was actually removed.
    pub fn clear(config_dir: &Path) -> Result<bool> {
        let path = Self::path(config_dir);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
