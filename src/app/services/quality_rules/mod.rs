//! Data quality rules for fuel-consumption batches
//!
//! This module detects statistically anomalous and incomplete records in a batch
//! and hands the resulting issues to an injected reporter.
//!
//! # Architecture
//!
//! - [`engine`] - `QualityRuleEngine`: validation, bounds checks, reporting, scoring
//! - [`statistics`] - Linear-interpolation quantiles and IQR fences
//! - [`reporter`] - `IssueReporter` capability and the tracing-backed reporter
//!
//! # Checks
//!
//! 1. **IQR outliers**: for `gallons_consumed` and `hours_operated`, any value
//!    strictly outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` yields a Medium issue.
//! 2. **Missing critical data**: for `production_id`, `date_recorded` and
//!    `gallons_consumed`, one High issue per field citing the number of rows
//!    where it is absent.
//! 3. **Configured bounds** (opt-in): values outside the rule set's min/max
//!    yield Low issues.

pub mod engine;
pub mod reporter;
pub mod statistics;

#[cfg(test)]
pub mod tests;

pub use engine::QualityRuleEngine;
pub use reporter::{IssueReporter, ReportOutcome, TracingReporter};
pub use statistics::{IqrFences, quantile};
