//! Application constants for fuel metrics
//!
//! This module contains the default rule bounds, metric tables, field names
//! and CLI defaults used throughout the fuel metrics pipeline.

// =============================================================================
// Record Field Names
// =============================================================================

/// Column / field names as they appear in input files and issue descriptions
pub mod fields {
    pub const RECORD_ID: &str = "record_id";
    pub const PRODUCTION_ID: &str = "production_id";
    pub const DATE_RECORDED: &str = "date_recorded";
    pub const EQUIPMENT_TYPE: &str = "equipment_type";
    pub const FUEL_TYPE: &str = "fuel_type";
    pub const GALLONS_CONSUMED: &str = "gallons_consumed";
    pub const HOURS_OPERATED: &str = "hours_operated";
    pub const CARBON_EMISSIONS_KG: &str = "carbon_emissions_kg";
    pub const FUEL_COST_USD: &str = "fuel_cost_usd";
}

/// Date format expected for `date_recorded` values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Quality Rule Constants
// =============================================================================

/// Rule category holding the fuel consumption bounds
pub const FUEL_CONSUMPTION_CATEGORY: &str = "fuel_consumption";

/// Multiplier applied to the IQR when computing outlier fences
pub const IQR_FENCE_MULTIPLIER: f64 = 1.5;

/// Quantile used for the lower quartile
pub const LOWER_QUARTILE: f64 = 0.25;

/// Quantile used for the upper quartile
pub const UPPER_QUARTILE: f64 = 0.75;

/// Default acceptable range for gallons consumed per record
pub const DEFAULT_GALLONS_MIN: f64 = 0.0;
pub const DEFAULT_GALLONS_MAX: f64 = 1000.0;

/// Default acceptable range for hours operated per record
pub const DEFAULT_HOURS_MIN: f64 = 0.0;
pub const DEFAULT_HOURS_MAX: f64 = 24.0;

/// Issue type label for batch-level completeness findings
pub const MISSING_DATA_ISSUE: &str = "missing_data";

/// Suffix appended to a field name for IQR outlier findings
pub const OUTLIER_SUFFIX: &str = "_outlier";

/// Suffix appended to a field name for configured-bounds findings
pub const OUT_OF_BOUNDS_SUFFIX: &str = "_out_of_bounds";

// =============================================================================
// Metric Tables
// =============================================================================

/// Carbon emission factors in kg CO2 per gallon
pub mod emission_factors {
    pub const DIESEL: f64 = 10.15;
    pub const GASOLINE: f64 = 8.89;
}

/// Fuel unit costs in USD per gallon
pub mod unit_costs {
    pub const DIESEL: f64 = 3.50;
    pub const GASOLINE: f64 = 3.25;
}

/// Canonical fuel labels used as metric table keys
pub mod fuel_labels {
    pub const DIESEL: &str = "Diesel";
    pub const GASOLINE: &str = "Gasoline";
}

/// Group key for records without a fuel type or production in summaries
pub const UNKNOWN_GROUP: &str = "Unknown";

// =============================================================================
// Pipeline and CLI Defaults
// =============================================================================

/// Default refresh interval for the watch command (one day)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Default input file for the CSV record source
pub const DEFAULT_INPUT_FILE: &str = "fuel_records.csv";

/// Default output file for the Parquet metrics sink
pub const DEFAULT_OUTPUT_FILE: &str = "output/fuel_metrics.parquet";

/// Log levels accepted in the `logging.level` config entry
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Log level used when neither flags nor config choose one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Application directory name under the user config dir
pub const APP_CONFIG_DIR: &str = "fuel-metrics";

/// Config file name inside the application config dir
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Environment variable overrides
pub mod env_vars {
    pub const INPUT: &str = "FUEL_METRICS_INPUT";
    pub const OUTPUT: &str = "FUEL_METRICS_OUTPUT";
    pub const ISSUE_LOG: &str = "FUEL_METRICS_ISSUE_LOG";
}
