//! Stricture CLI — coding-standard checker for C/C++ sources

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stricture")]
#[command(about = "Check C/C++ sources against coding-standard rules", long_about = None)]
#[command(version = stricture_core::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Worker threads (default: config value, then CPU count)
    #[arg(long, short = 'j', global = true)]
    jobs: Option<usize>,

    /// Disable per-rule progress output
    #[arg(long, global = true)]
    quiet: bool,

    /// Skip baseline reconciliation and report everything
    #[arg(long, global = true)]
    no_baseline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all configured rules (default command)
    Check {
        /// Source tree to analyze (default: current directory)
        path: Option<PathBuf>,
    },

    /// Snapshot current findings as the new baseline
    Baseline {
        /// Source tree to analyze (default: current directory)
        path: Option<PathBuf>,

        /// Remove the stored baseline instead
        #[arg(long)]
        clear: bool,
    },

    /// Write a starter .stricture.toml
    Init {
        /// Directory to initialize (default: current directory)
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Check { path }) => {
            if commands::check::run(path.as_deref(), &cli)? {
                std::process::exit(1);
            }
        }
        Some(Commands::Baseline { path, clear }) => {
            commands::baseline::run(path.as_deref(), *clear, &cli)?;
        }
        Some(Commands::Init { path }) => {
            commands::init::run(path.as_deref())?;
        }
        None => {
            if commands::check::run(None, &cli)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
