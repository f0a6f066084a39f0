//! Collaborator capabilities injected into the metrics pipeline
//!
//! The pipeline only knows these traits; CSV, Parquet and in-memory
//! implementations live in [`crate::app::adapters`].

use crate::Result;
use crate::app::models::{EnrichedRecord, FuelRecord};

/// Produces one materialized batch of fuel records per call
pub trait RecordSource: Send {
    fn extract(&mut self) -> Result<Vec<FuelRecord>>;

    /// Human-readable description used in log messages
    fn describe(&self) -> String {
        "record source".to_string()
    }
}

/// Accepts an enriched batch for storage
///
/// A failed load is not retried by the pipeline.
pub trait MetricsSink: Send {
    fn load(&mut self, batch: &[EnrichedRecord]) -> Result<()>;

    fn describe(&self) -> String {
        "metrics sink".to_string()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn extract(&mut self) -> Result<Vec<FuelRecord>> {
        (**self).extract()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for Box<S> {
    fn load(&mut self, batch: &[EnrichedRecord]) -> Result<()> {
        (**self).load(batch)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
