//! Per-record derivation of carbon emissions and fuel cost

use crate::app::models::{EnrichedRecord, FuelRecord, FuelType};
use crate::config::MetricsTables;
use std::sync::Arc;
use tracing::debug;

use super::summary::MetricsSummary;

/// Derives environmental and cost metrics from fuel records
///
/// Derivation is pure and per-record: the same record always yields the same
/// values regardless of batch order or size, and no rounding is applied.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use fuel_metrics::app::models::{FuelRecord, FuelType};
/// use fuel_metrics::app::services::metrics::MetricsCalculator;
/// use fuel_metrics::config::MetricsTables;
///
/// let calculator = MetricsCalculator::new(Arc::new(MetricsTables::default()));
/// let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let record = FuelRecord::new("1", date, 100.0).with_fuel_type(FuelType::Diesel);
///
/// let enriched = calculator.enrich(&record);
/// assert_eq!(enriched.carbon_emissions_kg, 1015.0);
/// assert_eq!(enriched.fuel_cost_usd, 350.0);
/// ```
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    tables: Arc<MetricsTables>,
}

impl MetricsCalculator {
    pub fn new(tables: Arc<MetricsTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &MetricsTables {
        &self.tables
    }

    /// Emission factor in kg CO2 per gallon; 0 for absent or unknown fuel
    pub fn emission_factor(&self, fuel_type: Option<&FuelType>) -> f64 {
        fuel_type.map_or(0.0, |fuel| self.tables.emission_factor(fuel))
    }

    /// Unit cost in USD per gallon; 0 for absent or unknown fuel
    pub fn unit_cost(&self, fuel_type: Option<&FuelType>) -> f64 {
        fuel_type.map_or(0.0, |fuel| self.tables.unit_cost(fuel))
    }

    pub fn carbon_emissions_kg(&self, record: &FuelRecord) -> f64 {
        record.gallons_consumed.unwrap_or(0.0) * self.emission_factor(record.fuel_type.as_ref())
    }

    pub fn fuel_cost_usd(&self, record: &FuelRecord) -> f64 {
        record.gallons_consumed.unwrap_or(0.0) * self.unit_cost(record.fuel_type.as_ref())
    }

    /// Derive the enriched form of a single record
    pub fn enrich(&self, record: &FuelRecord) -> EnrichedRecord {
        EnrichedRecord::new(
            record.clone(),
            self.carbon_emissions_kg(record),
            self.fuel_cost_usd(record),
        )
    }

    /// Derive enriched records for a whole batch, preserving order
    pub fn calculate_sustainability_metrics(&self, batch: &[FuelRecord]) -> Vec<EnrichedRecord> {
        let enriched: Vec<EnrichedRecord> = batch.iter().map(|record| self.enrich(record)).collect();

        debug!("Derived metrics for {} records", enriched.len());
        enriched
    }

    /// Aggregate an enriched batch into totals and breakdowns
    pub fn summarize(&self, enriched: &[EnrichedRecord]) -> MetricsSummary {
        MetricsSummary::from_records(enriched)
    }
}
