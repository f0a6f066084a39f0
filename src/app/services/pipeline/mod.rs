//! Refresh cycle orchestration for fuel metrics
//!
//! # Architecture
//!
//! - [`cycle`] - `MetricsPipeline`: the extract/validate/derive/load cycle
//! - [`collaborators`] - `RecordSource` and `MetricsSink` capabilities
//! - [`report`] - `CycleReport`, `CycleStatus`, `CycleStats` and state types
//!
//! # Failure Containment
//!
//! Quality issues are warnings: they are reported and counted, and derivation
//! still runs on the unmodified batch. An extraction or load error, or a panic
//! anywhere in the cycle, fails the cycle without crashing the caller.

pub mod collaborators;
pub mod cycle;
pub mod report;

#[cfg(test)]
pub mod tests;

pub use collaborators::{MetricsSink, RecordSource};
pub use cycle::MetricsPipeline;
pub use report::{CycleReport, CycleStage, CycleStats, CycleStatus, PipelineState};
