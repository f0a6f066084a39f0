//! Sustainability metric derivation
//!
//! Turns validated fuel records into enriched records carrying carbon emissions
//! (kg CO2) and fuel cost (USD), and aggregates enriched batches for reporting.
//!
//! # Architecture
//!
//! - [`calculator`] - `MetricsCalculator`: per-record and batch derivation
//! - [`summary`] - `MetricsSummary`: totals by fuel type and by production
//!
//! Both derived values are `gallons_consumed` times a per-fuel table entry.
//! Unknown or absent fuel types, and absent gallons, derive to 0.

pub mod calculator;
pub mod summary;

#[cfg(test)]
pub mod tests;

pub use calculator::MetricsCalculator;
pub use summary::{MetricTotals, MetricsSummary};
