//! Integration tests for the file-backed refresh cycle
//!
//! These tests drive a full cycle from a CSV file on disk, through the quality
//! rules and metric derivation, into a Parquet file and a JSON-lines issue log.

use fuel_metrics::Config;
use fuel_metrics::app::adapters::issue_log::read_issue_log;
use fuel_metrics::app::models::{IssueType, NumericField, Severity};
use fuel_metrics::app::services::pipeline::CycleStage;
use fuel_metrics::cli::commands::build_pipeline;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "record_id,production_id,date_recorded,equipment_type,fuel_type,gallons_consumed,hours_operated";

/// A week of generator fills for one production, with one runaway reading
fn create_production_week() -> String {
    let rows = [
        "1,PRD-104,2025-03-03,Generator,Diesel,50,5",
        "2,PRD-104,2025-03-04,Generator,Diesel,5000,5",
        "3,PRD-104,2025-03-05,Generator,Diesel,52,5",
        "4,PRD-104,2025-03-06,Generator,Diesel,48,5",
        "5,PRD-104,2025-03-07,Generator,Diesel,51,5",
    ];
    format!("{}\n{}\n", HEADER, rows.join("\n"))
}

struct Workspace {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
    issue_log: PathBuf,
}

impl Workspace {
    fn new(csv: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("fuel_records.csv");
        fs::write(&input, csv).unwrap();

        Self {
            input,
            output: dir.path().join("metrics").join("fuel_metrics.parquet"),
            issue_log: dir.path().join("logs").join("issues.jsonl"),
            _dir: dir,
        }
    }

    fn config(&self) -> Config {
        Config::default()
            .with_input_path(&self.input)
            .with_output_path(&self.output)
            .with_issue_log(&self.issue_log)
    }
}

fn read_parquet(path: &Path) -> DataFrame {
    let file = fs::File::open(path).unwrap();
    ParquetReader::new(file).finish().unwrap()
}

fn f64_column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

#[test]
fn test_csv_to_parquet_cycle() {
    let workspace = Workspace::new(&create_production_week());
    let mut pipeline = build_pipeline(&workspace.config()).unwrap();

    let report = pipeline.run_cycle();

    assert!(report.is_success());
    assert_eq!(report.stats.records_extracted, 5);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].record_id.as_deref(), Some("2"));
    assert_eq!(
        report.issues[0].issue_description,
        "gallons_consumed value 5000.0 is outside normal range"
    );

    let df = read_parquet(&workspace.output);
    assert_eq!(df.height(), 5);

    let emissions = f64_column(&df, "carbon_emissions_kg");
    assert_eq!(emissions[0], Some(507.5));
    assert_eq!(emissions[1], Some(50750.0));

    let costs = f64_column(&df, "fuel_cost_usd");
    assert_eq!(costs[1], Some(17500.0));

    let logged = read_issue_log(&workspace.issue_log).unwrap();
    assert_eq!(logged, report.issues);
}

#[test]
fn test_issue_log_accumulates_across_cycles() {
    let workspace = Workspace::new(&create_production_week());
    let mut pipeline = build_pipeline(&workspace.config()).unwrap();

    assert!(pipeline.run_cycle().is_success());
    assert!(pipeline.run_cycle().is_success());

    let logged = read_issue_log(&workspace.issue_log).unwrap();
    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0], logged[1]);

    // Output is replaced, not appended
    assert_eq!(read_parquet(&workspace.output).height(), 5);
}

#[test]
fn test_incomplete_rows_are_loaded_and_reported() {
    let csv = format!(
        "{}\n{}\n",
        HEADER,
        [
            "1,PRD-200,2025-04-01,Generator,Diesel,40,6",
            "2,,2025-04-01,Lighting Truck,Gasoline,12,4",
            "3,PRD-200,not-a-date,Generator,Diesel,38,6",
            "4,PRD-200,2025-04-02,Generator,,41,",
        ]
        .join("\n")
    );
    let workspace = Workspace::new(&csv);
    let mut pipeline = build_pipeline(&workspace.config()).unwrap();

    let report = pipeline.run_cycle();

    assert!(report.is_success());
    let missing: Vec<_> = report
        .issues
        .iter()
        .filter(|i| i.issue_type == IssueType::MissingData)
        .collect();
    assert_eq!(missing.len(), 2);
    assert!(missing.iter().all(|i| i.severity == Severity::High));
    assert!(missing[0].issue_description.contains("production_id"));
    assert!(missing[1].issue_description.contains("date_recorded"));

    let df = read_parquet(&workspace.output);
    assert_eq!(df.height(), 4);
    assert_eq!(df.column("production_id").unwrap().null_count(), 1);
    assert_eq!(df.column("date_recorded").unwrap().null_count(), 1);

    // Record 4 has no fuel type, so its metrics are zero
    let emissions = f64_column(&df, "carbon_emissions_kg");
    assert_eq!(emissions[3], Some(0.0));
    assert_eq!(report.metrics.by_fuel_type["Unknown"].records, 1);
}

#[test]
fn test_missing_input_fails_then_recovers() {
    let workspace = Workspace::new(&create_production_week());
    fs::remove_file(&workspace.input).unwrap();
    let mut pipeline = build_pipeline(&workspace.config()).unwrap();

    let failed = pipeline.run_cycle();
    assert_eq!(failed.failed_stage(), Some(CycleStage::Extract));
    assert!(failed.enriched.is_empty());
    assert!(!workspace.output.exists());

    fs::write(&workspace.input, create_production_week()).unwrap();
    let recovered = pipeline.run_cycle();

    assert!(recovered.is_success());
    assert_eq!(recovered.cycle, 2);
    assert_eq!(read_parquet(&workspace.output).height(), 5);
}

#[test]
fn test_enforced_bounds_from_config() {
    let workspace = Workspace::new(&create_production_week());
    let config = workspace.config().with_rule_bounds_enforced();
    let mut pipeline = build_pipeline(&config).unwrap();

    let report = pipeline.run_cycle();

    let types: Vec<IssueType> = report.issues.iter().map(|i| i.issue_type).collect();
    assert_eq!(
        types,
        vec![
            IssueType::Outlier(NumericField::GallonsConsumed),
            IssueType::OutOfBounds(NumericField::GallonsConsumed),
        ]
    );
    assert_eq!(report.issues[1].severity, Severity::Low);
    assert_eq!(read_issue_log(&workspace.issue_log).unwrap().len(), 2);
}
