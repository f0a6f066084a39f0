//! Tests for the metrics module


use crate::app::models::{FuelRecord, FuelType};
use crate::app::services::metrics::MetricsCalculator;
use crate::config::MetricsTables;
use chrono::NaiveDate;
use std::sync::Arc;

/// Create a calculator over the default emission and cost tables
pub fn create_test_calculator() -> MetricsCalculator {
    MetricsCalculator::new(Arc::new(MetricsTables::default()))
}

/// Create a record for the given production, fuel and gallons
pub fn create_fuel_record(production_id: &str, fuel_type: FuelType, gallons: f64) -> FuelRecord {
    FuelRecord::new(
        production_id,
        NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
        gallons,
    )
    .with_fuel_type(fuel_type)
}
