//! Tests for issue reporting and per-issue failure containment

use super::*;
use crate::app::adapters::memory::MemoryReporter;
use crate::app::models::{QualityIssue, Severity};
use crate::app::services::quality_rules::{IssueReporter, ReportOutcome, TracingReporter};
use crate::{Error, Result};

/// Fails on every n-th issue (1-based) and records the rest
struct FlakyReporter {
    fail_on: usize,
    seen: usize,
    delivered: Vec<QualityIssue>,
}

impl FlakyReporter {
    fn new(fail_on: usize) -> Self {
        Self {
            fail_on,
            seen: 0,
            delivered: Vec::new(),
        }
    }
}

impl IssueReporter for FlakyReporter {
    fn report(&mut self, issue: &QualityIssue) -> Result<()> {
        self.seen += 1;
        if self.seen == self.fail_on {
            return Err(Error::reporting("sink unavailable"));
        }
        self.delivered.push(issue.clone());
        Ok(())
    }
}

struct PanickingReporter {
    calls: usize,
}

impl IssueReporter for PanickingReporter {
    fn report(&mut self, _issue: &QualityIssue) -> Result<()> {
        self.calls += 1;
        if self.calls == 1 {
            panic!("reporter exploded");
        }
        Ok(())
    }
}

fn sample_issues() -> Vec<QualityIssue> {
    let engine = create_test_engine();
    let mut batch = create_test_batch(&[
        (100.0, 23.0),
        (110.0, 8.0),
        (900.0, 9.0),
        (105.0, 8.0),
        (95.0, 9.0),
        (100.0, 8.0),
    ]);
    batch[4].production_id = None;
    engine.validate(&batch)
}

#[test]
fn test_report_delivers_in_order() {
    let engine = create_test_engine();
    let issues = sample_issues();
    assert_eq!(issues.len(), 3);

    let handle = MemoryReporter::new();
    let mut reporter = handle.clone();
    let outcome = engine.report(&issues, &mut reporter);

    assert_eq!(
        outcome,
        ReportOutcome {
            delivered: 3,
            failed: 0
        }
    );
    assert_eq!(handle.issues(), issues);
}

#[test]
fn test_report_continues_after_error() {
    let engine = create_test_engine();
    let issues = sample_issues();

    let mut reporter = FlakyReporter::new(2);
    let outcome = engine.report(&issues, &mut reporter);

    assert_eq!(outcome.delivered, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.total(), issues.len());
    assert_eq!(reporter.delivered, vec![issues[0].clone(), issues[2].clone()]);
}

#[test]
fn test_report_contains_panic() {
    let engine = create_test_engine();
    let issues = sample_issues();

    let mut reporter = PanickingReporter { calls: 0 };
    let outcome = engine.report(&issues, &mut reporter);

    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.delivered, 2);
    assert_eq!(reporter.calls, 3);
}

#[test]
fn test_report_nothing() {
    let engine = create_test_engine();
    let mut reporter = MemoryReporter::new();

    let outcome = engine.report(&[], &mut reporter);

    assert_eq!(outcome, ReportOutcome::default());
    assert!(reporter.is_empty());
}

#[test]
fn test_tracing_reporter_accepts_all_severities() {
    let engine = create_test_engine();
    let mut issues = sample_issues();
    issues.push(QualityIssue {
        severity: Severity::Low,
        ..issues[0].clone()
    });

    let outcome = engine.report(&issues, &mut TracingReporter);
    assert_eq!(outcome.delivered, issues.len());
}

#[test]
fn test_fan_out_reaches_every_reporter() {
    let engine = create_test_engine();
    let issues = sample_issues();

    let first = MemoryReporter::new();
    let second = MemoryReporter::new();
    let mut reporters: Vec<Box<dyn IssueReporter>> = vec![
        Box::new(FlakyReporter::new(1)),
        Box::new(first.clone()),
        Box::new(second.clone()),
    ];

    let outcome = engine.report(&issues, &mut reporters);

    // The flaky reporter's failure is counted, but later reporters still see the issue
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.delivered, 2);
    assert_eq!(first.issues(), issues);
    assert_eq!(second.issues(), issues);
}
