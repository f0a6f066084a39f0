//! Metrics pipeline implementation and refresh cycle orchestration
//!
//! One cycle extracts a batch, validates it, derives enriched records and loads
//! them. Every error and panic raised by a stage or collaborator is contained at
//! the cycle boundary and turned into a failed [`CycleReport`].

use crate::app::services::metrics::MetricsCalculator;
use crate::app::services::quality_rules::{IssueReporter, QualityRuleEngine};
use crate::config::Config;
use crate::{Error, Result};
use std::error::Error as StdError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::{
    collaborators::{MetricsSink, RecordSource},
    report::{CycleReport, CycleStage, CycleStatus, PipelineState},
};

/// Extract -> validate -> derive -> load orchestration
///
/// `run_cycle` takes `&mut self`, so a single pipeline value can never run two
/// cycles at once. Callers that share a data source must serialize cycles.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use fuel_metrics::app::adapters::memory::{MemoryReporter, MemorySink, MemorySource};
/// use fuel_metrics::app::models::{FuelRecord, FuelType};
/// use fuel_metrics::app::services::pipeline::MetricsPipeline;
/// use fuel_metrics::config::Config;
///
/// let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let source = MemorySource::new(vec![
///     FuelRecord::new("1", date, 100.0).with_fuel_type(FuelType::Diesel),
/// ]);
/// let sink = MemorySink::new();
///
/// let mut pipeline =
///     MetricsPipeline::from_config(&Config::default(), source, sink.clone(), MemoryReporter::new());
/// let report = pipeline.run_cycle();
///
/// assert!(report.is_success());
/// assert_eq!(sink.loaded_batches()[0][0].carbon_emissions_kg, 1015.0);
/// ```
pub struct MetricsPipeline {
    source: Box<dyn RecordSource>,
    sink: Box<dyn MetricsSink>,
    reporter: Box<dyn IssueReporter>,
    engine: QualityRuleEngine,
    calculator: MetricsCalculator,
    /// Append configured-bounds issues after the IQR and completeness issues
    enforce_rule_bounds: bool,
    state: PipelineState,
    cycles_run: u64,
}

impl MetricsPipeline {
    /// Create a pipeline from its collaborators and components
    pub fn new(
        source: impl RecordSource + 'static,
        sink: impl MetricsSink + 'static,
        reporter: impl IssueReporter + 'static,
        engine: QualityRuleEngine,
        calculator: MetricsCalculator,
    ) -> Self {
        Self {
            source: Box::new(source),
            sink: Box::new(sink),
            reporter: Box::new(reporter),
            engine,
            calculator,
            enforce_rule_bounds: false,
            state: PipelineState::Idle,
            cycles_run: 0,
        }
    }

    /// Create a pipeline whose rules, metric tables and bounds setting come from config
    pub fn from_config(
        config: &Config,
        source: impl RecordSource + 'static,
        sink: impl MetricsSink + 'static,
        reporter: impl IssueReporter + 'static,
    ) -> Self {
        let engine = QualityRuleEngine::new(Arc::new(config.quality_rules.clone()));
        let calculator = MetricsCalculator::new(Arc::new(config.metrics.clone()));

        Self::new(source, sink, reporter, engine, calculator)
            .with_rule_bounds(config.pipeline.enforce_rule_bounds)
    }

    pub fn with_rule_bounds(mut self, enforce: bool) -> Self {
        self.enforce_rule_bounds = enforce;
        self
    }

    pub fn engine(&self) -> &QualityRuleEngine {
        &self.engine
    }

    pub fn calculator(&self) -> &MetricsCalculator {
        &self.calculator
    }

    /// Current state; always `Idle` between cycles
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    /// Run one complete refresh cycle
    ///
    /// Never panics and never returns an error: any failure is reported through
    /// [`CycleStatus::Failed`], and no enriched data is returned in that case.
    pub fn run_cycle(&mut self) -> CycleReport {
        let started = Instant::now();
        self.cycles_run += 1;

        let mut report = CycleReport::new(self.cycles_run);
        let mut stage = CycleStage::Extract;

        info!(
            "Starting refresh cycle {} from {}",
            self.cycles_run,
            self.source.describe()
        );

        let result = catch_unwind(AssertUnwindSafe(|| {
            self.execute(&mut stage, &mut report)
        }))
        .unwrap_or_else(|payload| Err(Error::panicked(payload)));

        match result {
            Ok(()) => {
                info!("{}", report.metrics.summary());
            }
            Err(e) => {
                let cause = error_chain(&e);
                error!("Refresh cycle {} failed during {}: {}", report.cycle, stage, cause);

                self.transition(PipelineState::Failed, &mut report);
                report.enriched = Vec::new();
                report.metrics = Default::default();
                report.status = CycleStatus::Failed { stage, cause };
            }
        }

        self.transition(PipelineState::Idle, &mut report);
        report.stats.elapsed = started.elapsed();

        info!("{}", report.summary());
        report
    }

    fn execute(&mut self, stage: &mut CycleStage, report: &mut CycleReport) -> Result<()> {
        // Extract
        *stage = CycleStage::Extract;
        let batch = self.source.extract()?;
        report.stats.records_extracted = batch.len();
        debug!("Extracted {} records", batch.len());
        self.transition(PipelineState::Extracted, report);

        // Validate
        *stage = CycleStage::Validate;
        let mut issues = self.engine.validate(&batch);
        if self.enforce_rule_bounds {
            issues.extend(self.engine.validate_bounds(&batch));
        }
        report.stats.issues_found = issues.len();
        report.quality_score = self.engine.quality_score(&batch);

        if !issues.is_empty() {
            warn!(
                "{} quality issues found in {} records",
                issues.len(),
                batch.len()
            );
            let outcome = self.engine.report(&issues, self.reporter.as_mut());
            report.stats.issues_reported = outcome.delivered;
            report.stats.report_failures = outcome.failed;
        }
        report.issues = issues;
        self.transition(PipelineState::Validated, report);

        // Derive from the unmodified batch; flagged records are kept
        *stage = CycleStage::Derive;
        let enriched = self.calculator.calculate_sustainability_metrics(&batch);
        report.stats.records_enriched = enriched.len();
        report.metrics = self.calculator.summarize(&enriched);
        self.transition(PipelineState::Derived, report);

        // Load
        *stage = CycleStage::Load;
        debug!("Loading {} records into {}", enriched.len(), self.sink.describe());
        self.sink.load(&enriched)?;
        report.enriched = enriched;
        self.transition(PipelineState::Loaded, report);

        Ok(())
    }

    fn transition(&mut self, next: PipelineState, report: &mut CycleReport) {
        debug!("Pipeline state: {:?} -> {:?}", self.state, next);
        self.state = next;
        report.transitions.push(next);
    }
}

impl std::fmt::Debug for MetricsPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsPipeline")
            .field("source", &self.source.describe())
            .field("sink", &self.sink.describe())
            .field("engine", &self.engine)
            .field("calculator", &self.calculator)
            .field("enforce_rule_bounds", &self.enforce_rule_bounds)
            .field("state", &self.state)
            .field("cycles_run", &self.cycles_run)
            .finish()
    }
}

/// Render an error with its full source chain
fn error_chain(error: &Error) -> String {
    let mut cause = error.to_string();
    let mut source = StdError::source(error);
    while let Some(inner) = source {
        cause.push_str(": ");
        cause.push_str(&inner.to_string());
        source = StdError::source(inner);
    }
    cause
}
