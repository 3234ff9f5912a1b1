//! Serialized progress reporting for the worker pool
//!
//! Workers on several threads report start/finish events; a single mutex
//! keeps counters and the emitted lines consistent.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

pub struct TaskProgress {
    total: usize,
    state: Mutex<ProgressState>,
}

struct ProgressState {
    started: usize,
    finished: usize,
    started_at: Instant,
    rule_started: HashMap<String, Instant>,
}

impl TaskProgress {
    pub fn new(total: usize) -> Self {
        TaskProgress {
            total,
            state: Mutex::new(ProgressState {
                started: 0,
                finished: 0,
                started_at: Instant::now(),
                rule_started: HashMap::new(),
            }),
        }
    }

    /// Called by a worker just before it starts checking a rule.
    pub fn start_task(&self, rule: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.started += 1;
        info!("Start analyzing for {} ({}/{})", rule, state.started, self.total);
        state.rule_started.insert(rule.to_string(), Instant::now());
    }

    /// Called by a worker right after a rule check completes.
    pub fn finish_task(&self, rule: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.finished += 1;
        let elapsed = state
            .rule_started
            .remove(rule)
            .map(|t| t.elapsed())
            .unwrap_or_default();
        info!(
            "Analysis of {} completed ({}%, {}/{}) [{}]",
            rule,
            percent(state.finished, self.total),
            state.finished,
            self.total,
            format_duration(elapsed)
        );
    }

    pub fn percent(&self) -> u32 {
        match self.state.lock() {
            Ok(state) => percent(state.finished, self.total),
            Err(_) => 0,
        }
    }

    /// Time since the pool started.
    pub fn elapsed(&self) -> Duration {
        match self.state.lock() {
            Ok(state) => state.started_at.elapsed(),
            Err(_) => Duration::ZERO,
        }
    }
}

fn percent(finished: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    (finished * 100 / total) as u32
}

/// `1s`, `1.5s`, `0.25s` — seconds with trailing zeros trimmed.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let millis = d.subsec_millis();
    if millis == 0 {
        return format!("{}s", secs);
    }
    let mut frac = format!("{:03}", millis);
    while frac.ends_with('0') {
        frac.pop();
    }
    format!("{}.{}s", secs, frac)
}
