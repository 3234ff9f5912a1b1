//! Init command — write a starter .stricture.toml

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use stricture_core::config::CONFIG_FILE;

const TEMPLATE: &str = r#"# Stricture configuration

[general]
# Worker threads for rule checks (0 = CPU count)
num_workers = 0
show_progress = true
# Exit non-zero when findings reach this severity: error | warning | info | never
fail_on = "error"

[baseline]
# Suppress findings already present in the baseline on reruns
enabled = true
# Directory holding baseline.json, relative to the analyzed tree
dir = ".stricture"

# Per-rule severity overrides
# [severity]
# "text/no_goto" = "error"

# Text rules: regex checks over source lines
# [[rules]]
# id = "no_goto"
# pattern = '\bgoto\b'
# message = "goto is not allowed"
# severity = "warning"
# paths = ["*.c", "*.h"]
"#;

pub fn run(path: Option<&Path>) -> Result<()> {
    let dir = path.unwrap_or_else(|| Path::new("."));
    let target = dir.join(CONFIG_FILE);

    if target.exists() {
        eprintln!(
            "  {} already exists — leaving it untouched.",
            target.display()
        );
        return Ok(());
    }

    std::fs::write(&target, TEMPLATE)
        .with_context(|| format!("writing {}", target.display()))?;
    eprintln!("  {} {}", "Created".green().bold(), target.display());
    Ok(())
}
