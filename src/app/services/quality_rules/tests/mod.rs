//! Tests for the quality rules module
//!
//! Unit tests for quantile statistics, the rule engine, and issue reporting.

pub mod reporter_tests;

// Test helper functions and fixtures
use crate::app::models::{FuelRecord, FuelType};
use crate::app::services::quality_rules::QualityRuleEngine;
use crate::config::QualityRuleSet;
use chrono::NaiveDate;
use std::sync::Arc;

/// Create an engine with the default rule set
pub fn create_test_engine() -> QualityRuleEngine {
    QualityRuleEngine::new(Arc::new(QualityRuleSet::default()))
}

pub fn test_date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

/// Create a complete diesel record with the given id, gallons and hours
pub fn create_test_record(record_id: &str, gallons: f64, hours: f64) -> FuelRecord {
    FuelRecord::new("1", test_date(1), gallons)
        .with_record_id(record_id)
        .with_fuel_type(FuelType::Diesel)
        .with_hours_operated(hours)
}

/// Create a batch of complete records from (gallons, hours) pairs, ids "1".."n"
pub fn create_test_batch(values: &[(f64, f64)]) -> Vec<FuelRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, (gallons, hours))| create_test_record(&(i + 1).to_string(), *gallons, *hours))
        .collect()
}
