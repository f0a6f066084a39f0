//! Tests for cycle report formatting and serialization

use super::*;
use crate::app::services::pipeline::{CycleStage, CycleStats, CycleStatus};
use std::time::Duration;

#[test]
fn test_stage_display() {
    assert_eq!(CycleStage::Extract.to_string(), "extract");
    assert_eq!(CycleStage::Load.to_string(), "load");
}

#[test]
fn test_stats_summary() {
    let stats = CycleStats {
        records_extracted: 5,
        issues_found: 2,
        issues_reported: 1,
        report_failures: 1,
        records_enriched: 5,
        elapsed: Duration::from_millis(1250),
    };

    assert_eq!(
        stats.summary(),
        "Cycle Summary: 5 records extracted | 2 quality issues (1 reported, 1 failed) | \
         5 records enriched | 1.25s"
    );
}

#[test]
fn test_report_summary_lines() {
    let (mut pipeline, _harness) =
        create_test_pipeline(MemorySource::new(create_outlier_batch()), MemorySink::new());
    let succeeded = pipeline.run_cycle().summary();
    assert!(succeeded.starts_with("Cycle 1 succeeded"));
    assert!(succeeded.contains("Quality score: 80.0%"));

    let (mut failing, _harness) =
        create_test_pipeline(MemorySource::failing("no route to host"), MemorySink::new());
    let failed = failing.run_cycle().summary();
    assert!(failed.starts_with("Cycle 1 failed during extract"));
    assert!(failed.contains("no route to host"));
}

#[test]
fn test_report_serializes_status_inline() {
    let (mut pipeline, _harness) =
        create_test_pipeline(MemorySource::failing("no route to host"), MemorySink::new());
    let report = pipeline.run_cycle();

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "failed");
    assert_eq!(json["stage"], "extract");
    assert_eq!(json["cycle"], 1);
    assert!(json["cause"].as_str().unwrap().contains("no route to host"));
    assert!(json.get("enriched").is_none());
}

#[test]
fn test_successful_report_json() {
    let (mut pipeline, _harness) =
        create_test_pipeline(MemorySource::new(create_outlier_batch()), MemorySink::new());
    let report = pipeline.run_cycle();
    assert_eq!(report.status, CycleStatus::Succeeded);

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "succeeded");
    assert_eq!(json["issues"][0]["issue_type"], "gallons_consumed_outlier");
    assert_eq!(json["issues"][0]["severity"], "Medium");
    assert_eq!(json["stats"]["records_enriched"], 5);
    assert_eq!(json["metrics"]["totals"]["records"], 5);
}
