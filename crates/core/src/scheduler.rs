//! Bounded worker pool executing analyzer tasks concurrently
//!
//! A fixed set of worker threads pulls tasks from one bounded queue; a
//! single collector thread is the sole writer of all aggregate state, so
//! results and the error slice need no locking. Cancellation is
//! cooperative: in-flight tasks always run to completion, and the error
//! slice stays indexed by submission id no matter the completion order.

use crate::config::CheckOptions;
use crate::finding::{FindingSet, Findings, Severity};
use crate::postprocess;
use crate::progress::TaskProgress;
use crate::registry::Analyze;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, Sender, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{error, info};

/// Cloneable cancellation token. The scheduler owns one; the CLI hooks it
/// to SIGINT, tests trip it directly. Once cancelled it stays cancelled.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a task produced no findings. Recorded at the task's own slot; never
/// aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("rule {rule} failed: {message}")]
    Failed { rule: String, message: String },

    #[error("panic while analyzing rule {rule}: {message}")]
    Panicked { rule: String, message: String },
}

/// One unit of work: one rule's check against one source tree. Owned by
/// the caller until submitted, then by exactly one worker.
pub struct AnalyzerTask {
    /// Stable submission index; the error slice is indexed by it
    pub id: usize,
    pub srcdir: PathBuf,
    pub rule: String,
    pub options: CheckOptions,
    pub severity_override: Option<Severity>,
    pub check: Arc<dyn Analyze>,
}

/// Produced by one worker, owned by the collector thereafter.
pub struct AnalyzerResult {
    pub id: usize,
    pub rule: String,
    pub findings: Findings,
    pub severity_override: Option<Severity>,
    pub error: Option<TaskError>,
}

/// Returned by [`Scheduler::add_task`] once shutdown has been observed;
/// the submission loop should stop enqueuing and call [`Scheduler::collect`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("scheduler is shutting down")]
pub struct Cancelled;

pub struct Scheduler {
    jobs: Option<SyncSender<AnalyzerTask>>,
    workers: Vec<JoinHandle<()>>,
    collector: Option<JoinHandle<(FindingSet, Vec<Option<TaskError>>)>>,
    cancel: CancelToken,
}

impl Scheduler {
    /// Start `num_workers` worker threads (available CPU count if 0) plus
    /// one collector. `task_count` fixes the size of the error slice.
    pub fn new(num_workers: usize, task_count: usize, show_progress: bool) -> Self {
        Self::with_cancel_token(num_workers, task_count, show_progress, CancelToken::new())
    }

    /// Like [`Scheduler::new`] with a caller-provided cancellation token,
    /// so several schedulers (e.g. under test) never share signal state.
    pub fn with_cancel_token(
        num_workers: usize,
        task_count: usize,
        show_progress: bool,
        cancel: CancelToken,
    ) -> Self {
        let num_workers = if num_workers == 0 {
            let n = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
            if show_progress {
                info!("Using {} worker thread(s)", n);
            }
            n
        } else {
            num_workers
        };

        // Bounded: add_task blocks when all workers are busy and the queue
        // is full, giving the submission loop backpressure.
        let (jobs_tx, jobs_rx) = sync_channel::<AnalyzerTask>(num_workers);
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));

        // Unbounded: a worker finishing after the collector stopped must
        // never block, or joining the pool would hang.
        let (results_tx, results_rx) = channel::<AnalyzerResult>();

        let progress = show_progress.then(|| Arc::new(TaskProgress::new(task_count)));

        let mut workers = Vec::with_capacity(num_workers);
        for _ in 0..num_workers {
            let jobs_rx = Arc::clone(&jobs_rx);
            let results_tx = results_tx.clone();
            let progress = progress.clone();
            workers.push(thread::spawn(move || {
                worker_loop(jobs_rx, results_tx, progress)
            }));
        }
        drop(results_tx);

        let collector_cancel = cancel.clone();
        let collector = thread::spawn(move || {
            collector_loop(results_rx, task_count, collector_cancel, show_progress)
        });

        Scheduler {
            jobs: Some(jobs_tx),
            workers,
            collector: Some(collector),
            cancel,
        }
    }

    /// The scheduler's cancellation token, for wiring to a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Enqueue a task, blocking while the queue is full.
    ///
    /// The shutdown check is folded into the enqueue itself: once the
    /// token is cancelled every call returns [`Cancelled`], so a
    /// submission loop stops on its next iteration without a separate
    /// polling step.
    pub fn add_task(&self, task: AnalyzerTask) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        match &self.jobs {
            Some(jobs) => jobs.send(task).map_err(|_| Cancelled),
            None => Err(Cancelled),
        }
    }

    /// Close the queue, wait for the workers and then the collector, and
    /// return the merged findings plus one error slot per submission id.
    ///
    /// After cancellation this returns whatever had been collected when
    /// the token tripped; queued and in-flight tasks still run to
    /// completion, their late results are discarded.
    pub fn collect(mut self) -> (FindingSet, Vec<Option<TaskError>>) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        match self.collector.take() {
            Some(collector) => collector
                .join()
                .expect("collector thread never panics"),
            None => (FindingSet::new(), Vec::new()),
        }
    }
}

fn worker_loop(
    jobs: Arc<Mutex<Receiver<AnalyzerTask>>>,
    results: Sender<AnalyzerResult>,
    progress: Option<Arc<TaskProgress>>,
) {
    loop {
        // Hold the lock only to pull the next task, never while running it.
        let task = {
            let Ok(receiver) = jobs.lock() else {
                return;
            };
            receiver.recv()
        };
        let task = match task {
            Ok(task) => task,
            Err(_) => return, // queue closed and drained
        };

        if let Some(progress) = &progress {
            progress.start_task(&task.rule);
        }
        let result = run_task(task, progress.is_some());
        if let Some(progress) = &progress {
            progress.finish_task(&result.rule);
        }

        if results.send(result).is_err() {
            // Collector already stopped; nothing left to report to.
            return;
        }
    }
}

/// Run one task inside a recovered scope: a panic in the rule's check
/// becomes a synthetic error for this task's slot instead of taking down
/// the pool.
fn run_task(mut task: AnalyzerTask, pool_progress: bool) -> AnalyzerResult {
    // While the pool reports progress, a rule must not emit its own;
    // nested runners would interleave with ours.
    if pool_progress {
        task.options.check_progress = false;
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        task.check.analyze(&task.srcdir, &task.options)
    }));

    let (findings, error) = match outcome {
        Ok(Ok(findings)) => (findings, None),
        Ok(Err(err)) => (
            Findings::new(),
            Some(TaskError::Failed {
                rule: task.rule.clone(),
                message: format!("{:#}", err),
            }),
        ),
        Err(panic) => (
            Findings::new(),
            Some(TaskError::Panicked {
                rule: task.rule.clone(),
                message: panic_message(&panic),
            }),
        ),
    };

    AnalyzerResult {
        id: task.id,
        rule: task.rule,
        findings,
        severity_override: task.severity_override,
        error,
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Sole writer of the aggregate state. Applies the post-processor, merges
/// findings into the shared set and records each task's error at its
/// submission id. Stops merging the moment the cancel token trips.
fn collector_loop(
    results: Receiver<AnalyzerResult>,
    task_count: usize,
    cancel: CancelToken,
    show_progress: bool,
) -> (FindingSet, Vec<Option<TaskError>>) {
    let mut findings = FindingSet::new();
    let mut errors: Vec<Option<TaskError>> = vec![None; task_count];

    for mut result in results {
        if cancel.is_cancelled() {
            if show_progress {
                info!("Interrupt received, stopping analysis");
            }
            break;
        }

        match &result.error {
            None => {
                postprocess::apply(&mut result);
                findings.add_all(result.findings);
            }
            Some(err) => {
                error!("Analyze {} got error: {}", result.rule, err);
            }
        }
        errors[result.id] = result.error;
    }

    (findings, errors)
}
