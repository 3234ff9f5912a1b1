//! Stricture Core — concurrent rule execution and incremental-result engine
//!
//! This crate provides the execution infrastructure behind Stricture:
//! - A bounded worker pool running rule checks concurrently, aggregating
//!   results deterministically and surviving any single rule's failure
//! - Unified-diff parsing and old/new line correlation
//! - A persisted findings baseline keyed to a commit, used to suppress
//!   unchanged pre-existing findings on reruns

pub mod baseline;
pub mod config;
pub mod dedupe;
pub mod diff;
pub mod finding;
pub mod postprocess;
pub mod progress;
pub mod registry;
pub mod rules;
pub mod scheduler;

pub use baseline::{Baseline, BaselineLocation, BaselineResult};
pub use config::{CheckConfig, CheckOptions, TextRule};
pub use dedupe::remove_duplicates;
pub use diff::{DiffFile, Hunk, ParseError, Patch};
pub use finding::{Finding, FindingKind, FindingSet, Findings, Location, Severity};
pub use registry::{Analyze, RuleRegistry};
pub use scheduler::{
    AnalyzerResult, AnalyzerTask, CancelToken, Cancelled, Scheduler, TaskError,
};

/// Stricture version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
