//! Tests for the pipeline module
//!
//! Cycle tests drive the pipeline with in-memory collaborators and inspect them
//! through shared handles after the cycle.

pub mod report_tests;

use crate::app::adapters::memory::{MemoryReporter, MemorySink, MemorySource};
use crate::app::models::{EquipmentType, FuelRecord, FuelType};
use crate::app::services::pipeline::{MetricsPipeline, RecordSource};
use crate::config::Config;
use crate::Result;
use chrono::NaiveDate;

pub fn test_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

/// Diesel generator record with 5 operating hours
pub fn create_diesel_record(record_id: &str, gallons: f64) -> FuelRecord {
    FuelRecord::new(record_id, test_date(1), gallons)
        .with_record_id(record_id)
        .with_fuel_type(FuelType::Diesel)
        .with_equipment_type(EquipmentType::Generator)
        .with_hours_operated(5.0)
}

/// Five records where only record "2" (5000 gallons) is an IQR outlier
pub fn create_outlier_batch() -> Vec<FuelRecord> {
    [50.0, 5000.0, 52.0, 48.0, 51.0]
        .iter()
        .enumerate()
        .map(|(i, gallons)| create_diesel_record(&(i + 1).to_string(), *gallons))
        .collect()
}

/// Handles kept by a test after the collaborators move into the pipeline
pub struct Harness {
    pub source: MemorySource,
    pub sink: MemorySink,
    pub reporter: MemoryReporter,
}

/// Build a default-config pipeline over shared in-memory collaborators
pub fn create_test_pipeline(source: MemorySource, sink: MemorySink) -> (MetricsPipeline, Harness) {
    let reporter = MemoryReporter::new();
    let pipeline =
        MetricsPipeline::from_config(&Config::default(), source.clone(), sink.clone(), reporter.clone());

    (
        pipeline,
        Harness {
            source,
            sink,
            reporter,
        },
    )
}

/// Source that panics on extraction
pub struct PanickingSource;

impl RecordSource for PanickingSource {
    fn extract(&mut self) -> Result<Vec<FuelRecord>> {
        panic!("source connection pool poisoned");
    }
}
