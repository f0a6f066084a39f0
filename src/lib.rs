//! Fuel Metrics Library
//!
//! A Rust library for checking the quality of production fuel-consumption records
//! and deriving carbon-emission and fuel-cost metrics from them.
//!
//! This library provides tools for:
//! - Detecting IQR outliers and missing critical fields in a batch of fuel records
//! - Deriving carbon emissions and fuel cost from fixed per-fuel tables
//! - Running a contained extract -> validate -> derive -> load refresh cycle
//! - Reading record batches from CSV and writing enriched batches to Parquet
//! - Comprehensive error handling with per-cycle failure containment

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod metrics;
        pub mod pipeline;
        pub mod quality_rules;
    }
    pub mod adapters {
        pub mod csv_source;
        pub mod issue_log;
        pub mod memory;
        pub mod parquet_sink;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{EnrichedRecord, FuelRecord, FuelType, QualityIssue, Severity};
pub use app::services::metrics::MetricsCalculator;
pub use app::services::pipeline::{CycleReport, CycleStatus, MetricsPipeline};
pub use app::services::quality_rules::QualityRuleEngine;
pub use config::Config;

/// Result type alias for fuel metrics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fuel metrics operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Tabular data (CSV / Parquet) processing failed
    #[error("Data frame error: {message}")]
    DataFrame {
        message: String,
        #[source]
        source: polars::error::PolarsError,
    },

    /// JSON serialization or deserialization failed
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The record source could not produce a batch
    #[error("Extraction failed: {message}")]
    Extraction { message: String },

    /// The metrics sink rejected the enriched batch
    #[error("Load failed: {message}")]
    Load { message: String },

    /// The issue reporter could not record an issue
    #[error("Issue reporting failed: {message}")]
    Reporting { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Data validation error
    #[error("Data validation error: {message}")]
    DataValidation { message: String },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },

    /// A collaborator panicked and the panic was contained
    #[error("Panicked: {message}")]
    Panicked { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a data frame error with context
    pub fn data_frame(message: impl Into<String>, source: polars::error::PolarsError) -> Self {
        Self::DataFrame {
            message: message.into(),
            source,
        }
    }

    /// Create a serialization error with context
    pub fn serialization(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            message: message.into(),
            source,
        }
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create a load error
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Create a reporting error
    pub fn reporting(message: impl Into<String>) -> Self {
        Self::Reporting {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Convert a caught panic payload into an error
    pub fn panicked(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked { message }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<polars::error::PolarsError> for Error {
    fn from(error: polars::error::PolarsError) -> Self {
        Self::DataFrame {
            message: "Data frame operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON processing failed".to_string(),
            source: error,
        }
    }
}
