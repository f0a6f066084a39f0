//! In-memory collaborators for tests, demos and embedding
//!
//! Each adapter is a cheap handle over shared state, so a clone can be moved into
//! a [`MetricsPipeline`](crate::app::services::pipeline::MetricsPipeline) while
//! the caller keeps another to inspect or change what the pipeline sees.

use crate::app::models::{EnrichedRecord, FuelRecord, QualityIssue};
use crate::app::services::pipeline::{MetricsSink, RecordSource};
use crate::app::services::quality_rules::IssueReporter;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Record Source
// =============================================================================

#[derive(Debug, Default)]
struct SourceState {
    records: Vec<FuelRecord>,
    failure: Option<String>,
    extractions: usize,
}

/// Record source that yields a fixed batch on every extraction
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    state: Arc<Mutex<SourceState>>,
}

impl MemorySource {
    pub fn new(records: Vec<FuelRecord>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SourceState {
                records,
                ..Default::default()
            })),
        }
    }

    /// A source whose every extraction fails with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SourceState {
                failure: Some(message.into()),
                ..Default::default()
            })),
        }
    }

    /// Replace the batch returned by subsequent extractions
    pub fn set_records(&self, records: Vec<FuelRecord>) {
        let mut state = lock(&self.state);
        state.records = records;
        state.failure = None;
    }

    /// Make subsequent extractions fail
    pub fn set_failure(&self, message: impl Into<String>) {
        lock(&self.state).failure = Some(message.into());
    }

    /// Number of extraction attempts so far
    pub fn extractions(&self) -> usize {
        lock(&self.state).extractions
    }
}

impl RecordSource for MemorySource {
    fn extract(&mut self) -> Result<Vec<FuelRecord>> {
        let mut state = lock(&self.state);
        state.extractions += 1;

        match &state.failure {
            Some(message) => Err(Error::extraction(message.clone())),
            None => Ok(state.records.clone()),
        }
    }

    fn describe(&self) -> String {
        format!("memory ({} records)", lock(&self.state).records.len())
    }
}

// =============================================================================
// Metrics Sink
// =============================================================================

#[derive(Debug, Default)]
struct SinkState {
    batches: Vec<Vec<EnrichedRecord>>,
    failure: Option<String>,
    load_calls: usize,
}

/// Metrics sink that keeps every loaded batch
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<SinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every batch with the given message
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SinkState {
                failure: Some(message.into()),
                ..Default::default()
            })),
        }
    }

    /// Batches accepted so far, oldest first
    pub fn loaded_batches(&self) -> Vec<Vec<EnrichedRecord>> {
        lock(&self.state).batches.clone()
    }

    pub fn last_batch(&self) -> Option<Vec<EnrichedRecord>> {
        lock(&self.state).batches.last().cloned()
    }

    /// Number of load attempts, including rejected ones
    pub fn load_calls(&self) -> usize {
        lock(&self.state).load_calls
    }
}

impl MetricsSink for MemorySink {
    fn load(&mut self, batch: &[EnrichedRecord]) -> Result<()> {
        let mut state = lock(&self.state);
        state.load_calls += 1;

        if let Some(message) = &state.failure {
            return Err(Error::load(message.clone()));
        }

        state.batches.push(batch.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// =============================================================================
// Issue Reporter
// =============================================================================

/// Issue reporter that collects issues in delivery order
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    issues: Arc<Mutex<Vec<QualityIssue>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> Vec<QualityIssue> {
        lock(&self.issues).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.issues).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.issues).clear();
    }
}

impl IssueReporter for MemoryReporter {
    fn report(&mut self, issue: &QualityIssue) -> Result<()> {
        lock(&self.issues).push(issue.clone());
        Ok(())
    }
}
