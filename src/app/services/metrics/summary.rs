//! Aggregated metrics for an enriched batch

use crate::app::models::EnrichedRecord;
use crate::constants::UNKNOWN_GROUP;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Running totals for one group of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTotals {
    pub records: usize,
    pub gallons: f64,
    pub carbon_emissions_kg: f64,
    pub fuel_cost_usd: f64,
}

impl MetricTotals {
    fn add(&mut self, record: &EnrichedRecord) {
        self.records += 1;
        self.gallons += record.record.gallons_consumed.unwrap_or(0.0);
        self.carbon_emissions_kg += record.carbon_emissions_kg;
        self.fuel_cost_usd += record.fuel_cost_usd;
    }
}

/// Batch totals plus per-fuel-type and per-production breakdowns
///
/// Records without a fuel type or production id are grouped under `"Unknown"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub totals: MetricTotals,
    pub by_fuel_type: BTreeMap<String, MetricTotals>,
    pub by_production: BTreeMap<String, MetricTotals>,
}

impl MetricsSummary {
    pub fn from_records(records: &[EnrichedRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.add(record);
        }
        summary
    }

    /// Fold one more enriched record into the summary
    pub fn add(&mut self, record: &EnrichedRecord) {
        self.totals.add(record);

        let fuel_key = record
            .record
            .fuel_type
            .as_ref()
            .map_or(UNKNOWN_GROUP, |fuel| fuel.as_str());
        self.by_fuel_type
            .entry(fuel_key.to_string())
            .or_default()
            .add(record);

        let production_key = record
            .record
            .production_id
            .as_deref()
            .unwrap_or(UNKNOWN_GROUP);
        self.by_production
            .entry(production_key.to_string())
            .or_default()
            .add(record);
    }

    pub fn record_count(&self) -> usize {
        self.totals.records
    }

    pub fn is_empty(&self) -> bool {
        self.totals.records == 0
    }

    /// Fuel type with the highest total emissions, if any
    pub fn top_emitting_fuel(&self) -> Option<(&str, f64)> {
        self.by_fuel_type
            .iter()
            .max_by(|a, b| a.1.carbon_emissions_kg.total_cmp(&b.1.carbon_emissions_kg))
            .map(|(fuel, totals)| (fuel.as_str(), totals.carbon_emissions_kg))
    }

    /// Get summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "Metrics Summary: {} records | {:.1} gallons | {:.2} kg CO2 | ${:.2} | \
             {} fuel types | {} productions",
            self.totals.records,
            self.totals.gallons,
            self.totals.carbon_emissions_kg,
            self.totals.fuel_cost_usd,
            self.by_fuel_type.len(),
            self.by_production.len()
        )
    }
}
