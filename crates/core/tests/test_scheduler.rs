use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stricture_core::{
    Analyze, AnalyzerTask, CancelToken, CheckConfig, CheckOptions, Finding, Findings, Scheduler,
    Severity, TaskError,
};

fn options() -> CheckOptions {
    CheckOptions::new(".", CheckConfig::default())
}

fn task(id: usize, rule: &str, check: Arc<dyn Analyze>) -> AnalyzerTask {
    let opts = options();
    AnalyzerTask {
        id,
        srcdir: opts.src_dir.clone(),
        rule: rule.to_string(),
        options: opts,
        severity_override: None,
        check,
    }
}

#[test]
fn test_errors_indexed_by_submission_id() {
    // Per-task sleeps force roughly reversed completion order; the error
    // slice must still line up with submission ids.
    let n = 8;
    let scheduler = Scheduler::new(4, n, false);

    for i in 0..n {
        let check: Arc<dyn Analyze> = Arc::new(move |_: &Path, _: &CheckOptions| -> Result<Findings> {
            thread::sleep(Duration::from_millis(((n - i) * 10) as u64));
            if i % 2 == 1 {
                anyhow::bail!("task {} failed", i);
            }
            let mut findings = Findings::new();
            findings.push(Finding::new(
                format!("file_{}.c", i),
                1,
                format!("finding from task {}", i),
            ));
            Ok(findings)
        });
        scheduler
            .add_task(task(i, &format!("text/rule_{}", i), check))
            .unwrap();
    }

    let (set, errors) = scheduler.collect();
    assert_eq!(errors.len(), n);
    for i in 0..n {
        if i % 2 == 1 {
            match &errors[i] {
                Some(TaskError::Failed { rule, message }) => {
                    assert_eq!(rule, &format!("text/rule_{}", i));
                    assert!(message.contains(&format!("task {} failed", i)));
                }
                other => panic!("expected Failed at slot {}, got {:?}", i, other),
            }
        } else {
            assert!(errors[i].is_none(), "unexpected error at slot {}", i);
        }
    }

    // every successful task's findings were collected
    assert_eq!(set.len(), n / 2);
}

#[test]
fn test_panic_contained_to_own_slot() {
    let scheduler = Scheduler::new(2, 4, false);

    for i in 0..4 {
        let check: Arc<dyn Analyze> = Arc::new(move |_: &Path, _: &CheckOptions| -> Result<Findings> {
            if i == 2 {
                panic!("rule blew up");
            }
            let mut findings = Findings::new();
            findings.push(Finding::new("a.c", i as u32 + 1, format!("ok {}", i)));
            Ok(findings)
        });
        scheduler
            .add_task(task(i, &format!("text/rule_{}", i), check))
            .unwrap();
    }

    let (set, errors) = scheduler.collect();
    assert_eq!(errors.len(), 4);
    match &errors[2] {
        Some(TaskError::Panicked { rule, message }) => {
            assert_eq!(rule, "text/rule_2");
            assert!(message.contains("rule blew up"));
        }
        other => panic!("expected Panicked at slot 2, got {:?}", other),
    }
    for i in [0, 1, 3] {
        assert!(errors[i].is_none());
    }
    assert_eq!(set.len(), 3);
}

#[test]
fn test_cancelled_token_rejects_submission() {
    let token = CancelToken::new();
    let scheduler = Scheduler::with_cancel_token(2, 3, false, token.clone());
    token.cancel();

    let check: Arc<dyn Analyze> =
        Arc::new(|_: &Path, _: &CheckOptions| -> Result<Findings> { Ok(Findings::new()) });
    assert!(scheduler.add_task(task(0, "text/rule_0", check)).is_err());

    let (set, errors) = scheduler.collect();
    assert!(set.is_empty());
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(Option::is_none));
}

#[test]
fn test_cancel_keeps_already_collected_work() {
    let token = CancelToken::new();
    let scheduler = Scheduler::with_cancel_token(2, 2, false, token.clone());

    let check: Arc<dyn Analyze> = Arc::new(|_: &Path, _: &CheckOptions| -> Result<Findings> {
        let mut findings = Findings::new();
        findings.push(Finding::new("a.c", 1, "early finding"));
        Ok(findings)
    });
    scheduler.add_task(task(0, "text/rule_0", check)).unwrap();

    // Give the worker and collector time to finish task 0 before the
    // interrupt arrives.
    thread::sleep(Duration::from_millis(300));
    token.cancel();

    let check: Arc<dyn Analyze> =
        Arc::new(|_: &Path, _: &CheckOptions| -> Result<Findings> { Ok(Findings::new()) });
    assert!(scheduler.add_task(task(1, "text/rule_1", check)).is_err());

    let (set, errors) = scheduler.collect();
    assert_eq!(set.len(), 1);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].is_none());
    assert!(errors[1].is_none());
}

#[test]
fn test_postprocess_applied_on_collection() {
    let scheduler = Scheduler::new(1, 1, false);

    let check: Arc<dyn Analyze> = Arc::new(|_: &Path, _: &CheckOptions| -> Result<Findings> {
        let mut findings = Findings::new();
        findings.push(Finding::new("src/main.c", 80, "line too long"));
        Ok(findings)
    });
    let mut t = task(0, "text/line_length", check);
    t.severity_override = Some(Severity::Error);
    scheduler.add_task(t).unwrap();

    let (set, errors) = scheduler.collect();
    assert!(errors[0].is_none());
    assert_eq!(set.len(), 1);
    let finding = set.iter().next().unwrap();
    assert_eq!(
        finding.message,
        "[LINE_LENGTH][text-line_length]: line too long"
    );
    assert_eq!(finding.ruleset, "text");
    assert_eq!(finding.rule_id, "line_length");
    assert_eq!(finding.severity, Severity::Error);
}

#[test]
fn test_identical_findings_across_tasks_merge_once() {
    let scheduler = Scheduler::new(2, 2, false);

    for id in 0..2 {
        let check: Arc<dyn Analyze> = Arc::new(|_: &Path, _: &CheckOptions| -> Result<Findings> {
            let mut findings = Findings::new();
            findings.push(Finding::new("a.c", 3, "duplicate report"));
            Ok(findings)
        });
        // same rule name, so the processed messages collide exactly
        scheduler.add_task(task(id, "text/dup_rule", check)).unwrap();
    }

    let (set, errors) = scheduler.collect();
    assert!(errors.iter().all(Option::is_none));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_zero_workers_defaults_to_cpu_count() {
    // just exercises the auto-sizing path
    let scheduler = Scheduler::new(0, 1, false);
    let check: Arc<dyn Analyze> = Arc::new(|_: &Path, _: &CheckOptions| -> Result<Findings> {
        let mut findings = Findings::new();
        findings.push(Finding::new("a.c", 1, "ok"));
        Ok(findings)
    });
    scheduler.add_task(task(0, "text/rule_0", check)).unwrap();
    let (set, errors) = scheduler.collect();
    assert_eq!(set.len(), 1);
    assert!(errors[0].is_none());
}
