//! Cycle outcome, statistics and state types

use crate::app::models::{EnrichedRecord, QualityIssue};
use crate::app::services::metrics::MetricsSummary;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Step of a refresh cycle, used to locate failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStage {
    Extract,
    Validate,
    Derive,
    Load,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extract => "extract",
            Self::Validate => "validate",
            Self::Derive => "derive",
            Self::Load => "load",
        };
        f.write_str(name)
    }
}

/// Pipeline state between and within cycles
///
/// `Idle -> Extracted -> Validated -> Derived -> Loaded -> Idle`, or
/// `... -> Failed -> Idle` from any point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Extracted,
    Validated,
    Derived,
    Loaded,
    Failed,
}

/// Terminal status of one cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CycleStatus {
    Succeeded,
    Failed { stage: CycleStage, cause: String },
}

/// Statistics for a single refresh cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleStats {
    /// Records returned by the source
    pub records_extracted: usize,
    /// Quality issues found (outliers, missing data and, if enabled, bounds)
    pub issues_found: usize,
    /// Issues the reporter accepted
    pub issues_reported: usize,
    /// Issues the reporter failed on
    pub report_failures: usize,
    /// Records carried through derivation
    pub records_enriched: usize,
    /// Wall time of the whole cycle
    pub elapsed: Duration,
}

impl CycleStats {
    /// Get summary string for logging
    pub fn summary(&self) -> String {
        format!(
            "Cycle Summary: {} records extracted | {} quality issues ({} reported, {} failed) | \
             {} records enriched | {:.2}s",
            self.records_extracted,
            self.issues_found,
            self.issues_reported,
            self.report_failures,
            self.records_enriched,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Everything produced by one call to `run_cycle`
///
/// On failure `enriched` is empty and `metrics` is the empty summary; issues
/// found before the failure are still listed.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// 1-based cycle number for this pipeline value
    pub cycle: u64,
    #[serde(flatten)]
    pub status: CycleStatus,
    pub issues: Vec<QualityIssue>,
    #[serde(skip)]
    pub enriched: Vec<EnrichedRecord>,
    pub stats: CycleStats,
    pub metrics: MetricsSummary,
    /// Percentage of records that are complete and not outliers
    pub quality_score: f64,
    /// States entered during the cycle, in order
    pub transitions: Vec<PipelineState>,
}

impl CycleReport {
    pub(crate) fn new(cycle: u64) -> Self {
        Self {
            cycle,
            status: CycleStatus::Succeeded,
            issues: Vec::new(),
            enriched: Vec::new(),
            stats: CycleStats::default(),
            metrics: MetricsSummary::default(),
            quality_score: 100.0,
            transitions: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, CycleStatus::Succeeded)
    }

    /// Succeeded but with quality issues
    pub fn has_warnings(&self) -> bool {
        self.is_success() && !self.issues.is_empty()
    }

    pub fn failed_stage(&self) -> Option<CycleStage> {
        match &self.status {
            CycleStatus::Failed { stage, .. } => Some(*stage),
            CycleStatus::Succeeded => None,
        }
    }

    pub fn failure_cause(&self) -> Option<&str> {
        match &self.status {
            CycleStatus::Failed { cause, .. } => Some(cause),
            CycleStatus::Succeeded => None,
        }
    }

    /// Get summary string for logging
    pub fn summary(&self) -> String {
        match &self.status {
            CycleStatus::Succeeded => format!(
                "Cycle {} succeeded | {} | Quality score: {:.1}%",
                self.cycle,
                self.stats.summary(),
                self.quality_score
            ),
            CycleStatus::Failed { stage, cause } => format!(
                "Cycle {} failed during {}: {} | {}",
                self.cycle,
                stage,
                cause,
                self.stats.summary()
            ),
        }
    }
}
