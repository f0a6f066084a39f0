//! Quality rule engine for fuel record batches
//!
//! Applies statistical (IQR) outlier detection and critical-field completeness
//! checks to a batch, and optionally the configured min/max bounds. The engine
//! is stateless across calls apart from its immutable rule set.

use crate::Error;
use crate::app::models::{CriticalField, FuelRecord, NumericField, QualityIssue};
use crate::config::QualityRuleSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::reporter::{IssueReporter, ReportOutcome};
use super::statistics::IqrFences;

/// Quality rule engine
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use fuel_metrics::app::models::FuelRecord;
/// use fuel_metrics::app::services::quality_rules::QualityRuleEngine;
/// use fuel_metrics::config::QualityRuleSet;
///
/// let engine = QualityRuleEngine::new(Arc::new(QualityRuleSet::default()));
/// let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let batch = vec![FuelRecord::new("1", date, 50.0), FuelRecord::new("1", date, 52.0)];
///
/// assert!(engine.validate(&batch).is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct QualityRuleEngine {
    rules: Arc<QualityRuleSet>,
}

impl QualityRuleEngine {
    /// Create an engine over a shared, immutable rule set
    pub fn new(rules: Arc<QualityRuleSet>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &QualityRuleSet {
        &self.rules
    }

    /// Produce the complete list of quality issues for a batch
    ///
    /// Outlier issues come first, grouped by field (gallons, then hours) in row
    /// order; batch-level missing-data issues follow in critical-field order.
    pub fn validate(&self, batch: &[FuelRecord]) -> Vec<QualityIssue> {
        let issues: Vec<QualityIssue> = self.issues(batch).collect();

        info!(
            "Validated {} records: {} quality issues found",
            batch.len(),
            issues.len()
        );

        issues
    }

    /// Lazily produce the same issues as [`validate`](Self::validate)
    ///
    /// The iterator borrows the batch and can be recreated at any time.
    pub fn issues<'a>(&'a self, batch: &'a [FuelRecord]) -> impl Iterator<Item = QualityIssue> + 'a {
        NumericField::ALL
            .into_iter()
            .flat_map(move |field| field_outliers(field, batch))
            .chain(missing_data_issues(batch))
    }

    /// Flag values outside the configured `fuel_consumption` bounds
    ///
    /// Fields without configured bounds are skipped.
    pub fn validate_bounds(&self, batch: &[FuelRecord]) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        for field in NumericField::ALL {
            let Some(bounds) = self.rules.fuel_consumption_bounds(field) else {
                debug!("No bounds configured for {}", field);
                continue;
            };

            for record in batch {
                let Some(value) = field.value(record) else {
                    continue;
                };
                if !bounds.contains(value) {
                    issues.push(QualityIssue::out_of_bounds(
                        field,
                        value,
                        bounds,
                        record.record_id.clone(),
                    ));
                }
            }
        }

        issues
    }

    /// Hand every issue to the reporter, in order
    ///
    /// A reporter error or panic on one issue is logged and counted; the
    /// remaining issues are still reported.
    pub fn report(&self, issues: &[QualityIssue], reporter: &mut dyn IssueReporter) -> ReportOutcome {
        let mut outcome = ReportOutcome::default();

        for issue in issues {
            let result = catch_unwind(AssertUnwindSafe(|| reporter.report(issue)))
                .unwrap_or_else(|payload| Err(Error::panicked(payload)));

            match result {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    warn!("Failed to report quality issue '{}': {}", issue, e);
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Percentage of records that are critically complete and not flagged as outliers
    ///
    /// An empty batch scores 100.
    pub fn quality_score(&self, batch: &[FuelRecord]) -> f64 {
        if batch.is_empty() {
            return 100.0;
        }

        let mut flagged = vec![false; batch.len()];
        for field in NumericField::ALL {
            for (row, _) in outlier_rows(field, batch) {
                flagged[row] = true;
            }
        }

        let clean = batch
            .iter()
            .zip(&flagged)
            .filter(|(record, is_flagged)| record.is_critically_complete() && !**is_flagged)
            .count();

        (clean as f64 / batch.len() as f64) * 100.0
    }
}

/// Row indices and values of a field that fall outside its IQR fences
fn outlier_rows(field: NumericField, batch: &[FuelRecord]) -> Vec<(usize, f64)> {
    let Some(fences) = IqrFences::from_values(batch.iter().filter_map(|r| field.value(r))) else {
        return Vec::new();
    };

    debug!(
        "{} fences: Q1={} Q3={} IQR={} range=[{}, {}]",
        field,
        fences.q1,
        fences.q3,
        fences.iqr(),
        fences.lower,
        fences.upper
    );

    batch
        .iter()
        .enumerate()
        .filter_map(|(row, record)| {
            let value = field.value(record)?;
            fences.is_outlier(value).then_some((row, value))
        })
        .collect()
}

/// Outlier issues for one field, in row order
fn field_outliers(field: NumericField, batch: &[FuelRecord]) -> Vec<QualityIssue> {
    outlier_rows(field, batch)
        .into_iter()
        .map(|(row, value)| QualityIssue::outlier(field, value, batch[row].record_id.clone()))
        .collect()
}

/// One batch-level issue per critical field with absent values
fn missing_data_issues(batch: &[FuelRecord]) -> impl Iterator<Item = QualityIssue> + '_ {
    CriticalField::ALL.into_iter().filter_map(move |field| {
        let missing = batch.iter().filter(|r| field.is_missing(r)).count();
        (missing > 0).then(|| QualityIssue::missing_data(field, missing))
    })
}
