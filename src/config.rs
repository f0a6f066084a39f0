//! Configuration management and validation.
//!
//! Provides the immutable quality rule set, the emission-factor and unit-cost
//! tables, and pipeline settings. Configuration is layered: defaults, then an
//! optional JSON file, then environment variables, then CLI flags.

use crate::app::models::{FuelType, NumericField};
use crate::constants::{
    APP_CONFIG_DIR, CONFIG_FILE_NAME, DEFAULT_GALLONS_MAX, DEFAULT_GALLONS_MIN,
    DEFAULT_HOURS_MAX, DEFAULT_HOURS_MIN, DEFAULT_INPUT_FILE, DEFAULT_LOG_LEVEL,
    DEFAULT_OUTPUT_FILE, DEFAULT_REFRESH_INTERVAL_SECS, FUEL_CONSUMPTION_CATEGORY, LOG_LEVELS,
    emission_factors, env_vars, fuel_labels, unit_costs,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

// =============================================================================
// Quality Rules
// =============================================================================

/// Acceptable inclusive range for a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
}

impl FieldBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when `value` lies within `[min, max]`
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

type RuleCategories = BTreeMap<String, BTreeMap<String, FieldBounds>>;

/// Per-category field bounds, e.g. `fuel_consumption.gallons_consumed = {0, 1000}`
///
/// Built once at start-up and shared read-only; callers that need different
/// thresholds construct a separate instance. When deserialized, the listed
/// fields replace the matching default bounds and all other defaults remain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleCategories", into = "RuleCategories")]
pub struct QualityRuleSet {
    categories: RuleCategories,
}

impl QualityRuleSet {
    /// Create an empty rule set
    pub fn empty() -> Self {
        Self {
            categories: BTreeMap::new(),
        }
    }

    /// Return a copy of this rule set with one field's bounds replaced
    pub fn with_bounds(
        mut self,
        category: impl Into<String>,
        field: impl Into<String>,
        bounds: FieldBounds,
    ) -> Self {
        self.categories
            .entry(category.into())
            .or_default()
            .insert(field.into(), bounds);
        self
    }

    /// Look up the bounds for a field within a category
    pub fn bounds(&self, category: &str, field: &str) -> Option<&FieldBounds> {
        self.categories.get(category)?.get(field)
    }

    /// Bounds for a numeric field of the fuel consumption category
    pub fn fuel_consumption_bounds(&self, field: NumericField) -> Option<&FieldBounds> {
        self.bounds(FUEL_CONSUMPTION_CATEGORY, field.name())
    }

    /// Iterate over all (category, field, bounds) entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &FieldBounds)> {
        self.categories.iter().flat_map(|(category, fields)| {
            fields
                .iter()
                .map(move |(field, bounds)| (category.as_str(), field.as_str(), bounds))
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (category, field, bounds) in self.iter() {
            if !bounds.min.is_finite() || !bounds.max.is_finite() {
                return Err(Error::configuration(format!(
                    "Bounds for {}.{} must be finite",
                    category, field
                )));
            }
            if bounds.min > bounds.max {
                return Err(Error::configuration(format!(
                    "Bounds for {}.{} are inverted: min {} > max {}",
                    category, field, bounds.min, bounds.max
                )));
            }
        }
        Ok(())
    }
}

impl Default for QualityRuleSet {
    fn default() -> Self {
        Self::empty()
            .with_bounds(
                FUEL_CONSUMPTION_CATEGORY,
                NumericField::GallonsConsumed.name(),
                FieldBounds::new(DEFAULT_GALLONS_MIN, DEFAULT_GALLONS_MAX),
            )
            .with_bounds(
                FUEL_CONSUMPTION_CATEGORY,
                NumericField::HoursOperated.name(),
                FieldBounds::new(DEFAULT_HOURS_MIN, DEFAULT_HOURS_MAX),
            )
    }
}

impl From<RuleCategories> for QualityRuleSet {
    fn from(overrides: RuleCategories) -> Self {
        overrides
            .into_iter()
            .flat_map(|(category, fields)| {
                fields
                    .into_iter()
                    .map(move |(field, bounds)| (category.clone(), field, bounds))
            })
            .fold(Self::default(), |rules, (category, field, bounds)| {
                rules.with_bounds(category, field, bounds)
            })
    }
}

impl From<QualityRuleSet> for RuleCategories {
    fn from(rules: QualityRuleSet) -> Self {
        rules.categories
    }
}

// =============================================================================
// Metric Tables
// =============================================================================

/// Emission factors (kg CO2 / gallon) and unit costs (USD / gallon) keyed by fuel label
///
/// Fuel labels match case-insensitively. When deserialized, the listed entries
/// are layered over the built-in Diesel and Gasoline values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MetricsTablesOverrides")]
pub struct MetricsTables {
    pub emission_factor: BTreeMap<String, f64>,
    pub unit_cost: BTreeMap<String, f64>,
}

impl MetricsTables {
    /// Emission factor for a fuel type; 0 when the fuel is not in the table
    pub fn emission_factor(&self, fuel_type: &FuelType) -> f64 {
        lookup_fuel(&self.emission_factor, fuel_type)
    }

    /// Unit cost for a fuel type; 0 when the fuel is not in the table
    pub fn unit_cost(&self, fuel_type: &FuelType) -> f64 {
        lookup_fuel(&self.unit_cost, fuel_type)
    }

    pub fn with_emission_factor(mut self, fuel_label: impl Into<String>, factor: f64) -> Self {
        insert_fuel(&mut self.emission_factor, fuel_label.into(), factor);
        self
    }

    pub fn with_unit_cost(mut self, fuel_label: impl Into<String>, cost: f64) -> Self {
        insert_fuel(&mut self.unit_cost, fuel_label.into(), cost);
        self
    }

    pub fn validate(&self) -> Result<()> {
        let tables = [
            ("emission_factor", &self.emission_factor),
            ("unit_cost", &self.unit_cost),
        ];
        for (table, entries) in tables {
            for (fuel, value) in entries {
                if !value.is_finite() || *value < 0.0 {
                    return Err(Error::configuration(format!(
                        "{}[{}] must be a finite non-negative number, got {}",
                        table, fuel, value
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for MetricsTables {
    fn default() -> Self {
        let emission_factor = BTreeMap::from([
            (fuel_labels::DIESEL.to_string(), emission_factors::DIESEL),
            (fuel_labels::GASOLINE.to_string(), emission_factors::GASOLINE),
        ]);
        let unit_cost = BTreeMap::from([
            (fuel_labels::DIESEL.to_string(), unit_costs::DIESEL),
            (fuel_labels::GASOLINE.to_string(), unit_costs::GASOLINE),
        ]);

        Self {
            emission_factor,
            unit_cost,
        }
    }
}

/// Metric table entries as written in a config file; either table may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetricsTablesOverrides {
    emission_factor: BTreeMap<String, f64>,
    unit_cost: BTreeMap<String, f64>,
}

impl From<MetricsTablesOverrides> for MetricsTables {
    fn from(overrides: MetricsTablesOverrides) -> Self {
        let mut tables = Self::default();
        for (fuel, factor) in overrides.emission_factor {
            insert_fuel(&mut tables.emission_factor, fuel, factor);
        }
        for (fuel, cost) in overrides.unit_cost {
            insert_fuel(&mut tables.unit_cost, fuel, cost);
        }
        tables
    }
}

fn lookup_fuel(table: &BTreeMap<String, f64>, fuel_type: &FuelType) -> f64 {
    let label = fuel_type.as_str();
    table
        .get(label)
        .or_else(|| {
            table
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(label))
                .map(|(_, value)| value)
        })
        .copied()
        .unwrap_or(0.0)
}

/// Insert an entry, replacing any key that differs only in case
fn insert_fuel(table: &mut BTreeMap<String, f64>, fuel_label: String, value: f64) {
    table.retain(|key, _| !key.eq_ignore_ascii_case(&fuel_label));
    table.insert(fuel_label, value);
}

// =============================================================================
// Pipeline and Logging Settings
// =============================================================================

/// Settings for the refresh cycle and its file-backed collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// CSV file read by the record source
    pub input_path: PathBuf,

    /// Parquet file written by the metrics sink
    pub output_path: PathBuf,

    /// Optional JSON-lines file that quality issues are appended to
    pub issue_log_path: Option<PathBuf>,

    /// Also flag values outside the configured rule bounds
    pub enforce_rule_bounds: bool,

    /// Seconds between cycles in watch mode
    pub refresh_interval_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            issue_log_path: None,
            enforce_rule_bounds: false,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

// =============================================================================
// Top-level Configuration
// =============================================================================

/// Complete configuration for a fuel metrics process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub quality_rules: QualityRuleSet,
    pub metrics: MetricsTables,
    pub pipeline: PipelineSettings,
    pub logging: LoggingConfig,
}

impl Config {
    /// Default config file location, `<config_dir>/fuel-metrics/config.json`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::configuration("Could not determine user configuration directory")
        })?;
        Ok(config_dir.join(APP_CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::io(
                format!("Failed to read config file '{}'", path.display()),
                e,
            )
        })?;

        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            Error::serialization(
                format!("Failed to parse config file '{}'", path.display()),
                e,
            )
        })?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load defaults, overlay the config file (if any), then environment overrides
    pub fn load_layered(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `FUEL_METRICS_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(input) = lookup(env_vars::INPUT) {
            debug!("Overriding input path from environment: {}", input);
            self.pipeline.input_path = PathBuf::from(input);
        }
        if let Some(output) = lookup(env_vars::OUTPUT) {
            debug!("Overriding output path from environment: {}", output);
            self.pipeline.output_path = PathBuf::from(output);
        }
        if let Some(issue_log) = lookup(env_vars::ISSUE_LOG) {
            debug!("Overriding issue log path from environment: {}", issue_log);
            self.pipeline.issue_log_path = Some(PathBuf::from(issue_log));
        }
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.quality_rules.validate()?;
        self.metrics.validate()?;

        if self.pipeline.refresh_interval_secs == 0 {
            return Err(Error::configuration(
                "Refresh interval must be greater than 0 seconds",
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(Error::configuration(format!(
                "Unknown log level '{}', expected one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    pub fn with_quality_rules(mut self, quality_rules: QualityRuleSet) -> Self {
        self.quality_rules = quality_rules;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsTables) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_input_path(mut self, input_path: impl Into<PathBuf>) -> Self {
        self.pipeline.input_path = input_path.into();
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.pipeline.output_path = output_path.into();
        self
    }

    pub fn with_issue_log(mut self, issue_log_path: impl Into<PathBuf>) -> Self {
        self.pipeline.issue_log_path = Some(issue_log_path.into());
        self
    }

    pub fn with_rule_bounds_enforced(mut self) -> Self {
        self.pipeline.enforce_rule_bounds = true;
        self
    }

    pub fn with_refresh_interval(mut self, seconds: u64) -> Self {
        self.pipeline.refresh_interval_secs = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_rule_set() {
        let rules = QualityRuleSet::default();

        let gallons = rules
            .fuel_consumption_bounds(NumericField::GallonsConsumed)
            .unwrap();
        assert_eq!(*gallons, FieldBounds::new(0.0, 1000.0));

        let hours = rules
            .bounds("fuel_consumption", "hours_operated")
            .unwrap();
        assert_eq!(*hours, FieldBounds::new(0.0, 24.0));

        assert!(rules.bounds("fuel_consumption", "fuel_type").is_none());
        assert!(rules.bounds("equipment", "hours_operated").is_none());
        assert_eq!(rules.iter().count(), 2);
    }

    #[test]
    fn test_field_bounds_inclusive() {
        let bounds = FieldBounds::new(0.0, 24.0);
        assert!(bounds.contains(0.0));
        assert!(bounds.contains(24.0));
        assert!(!bounds.contains(24.01));
        assert!(!bounds.contains(-0.5));
    }

    #[test]
    fn test_default_metric_tables() {
        let tables = MetricsTables::default();
        assert_eq!(tables.emission_factor(&FuelType::Diesel), 10.15);
        assert_eq!(tables.emission_factor(&FuelType::Gasoline), 8.89);
        assert_eq!(tables.unit_cost(&FuelType::Diesel), 3.50);
        assert_eq!(tables.unit_cost(&FuelType::Gasoline), 3.25);

        let biodiesel = FuelType::Unrecognized("Biodiesel".to_string());
        assert_eq!(tables.emission_factor(&biodiesel), 0.0);
        assert_eq!(tables.unit_cost(&biodiesel), 0.0);

        let extended = tables.with_emission_factor("Biodiesel", 9.46);
        assert_eq!(extended.emission_factor(&biodiesel), 9.46);
    }

    #[test]
    fn test_config_validation_rejects_inverted_bounds() {
        let rules = QualityRuleSet::default().with_bounds(
            "fuel_consumption",
            "gallons_consumed",
            FieldBounds::new(500.0, 100.0),
        );
        let config = Config::default().with_quality_rules(rules);
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_config_validation_rejects_negative_factor() {
        let metrics = MetricsTables::default().with_unit_cost("Diesel", -1.0);
        let config = Config::default().with_metrics(metrics);
        assert!(config.validate().is_err());

        let config = Config::default().with_refresh_interval(0);
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let config = Config::default()
            .with_input_path("/data/fuel.csv")
            .with_rule_bounds_enforced()
            .with_metrics(MetricsTables::default().with_emission_factor("Propane", 5.72));
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "quality_rules": {
                    "fuel_consumption": {
                        "gallons_consumed": {"min": 0, "max": 250},
                        "hours_operated": {"min": 0, "max": 12}
                    }
                },
                "pipeline": {"input_path": "daily.csv"}
            }"#,
        )
        .unwrap();

        let loaded = Config::load_layered(Some(&path)).unwrap();
        let gallons = loaded
            .quality_rules
            .fuel_consumption_bounds(NumericField::GallonsConsumed)
            .unwrap();
        assert_eq!(gallons.max, 250.0);
        assert_eq!(loaded.pipeline.input_path, PathBuf::from("daily.csv"));
        assert_eq!(loaded.metrics, MetricsTables::default());
        assert_eq!(
            loaded.pipeline.refresh_interval_secs,
            DEFAULT_REFRESH_INTERVAL_SECS
        );
    }

    #[test]
    fn test_partial_metrics_section_keeps_other_fuels() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"metrics": {"emission_factor": {"Diesel": 11.0}, "unit_cost": {"Diesel": 4.0}}}"#,
        )
        .unwrap();

        let loaded = Config::load_layered(Some(&path)).unwrap();
        assert_eq!(loaded.metrics.emission_factor(&FuelType::Diesel), 11.0);
        assert_eq!(loaded.metrics.unit_cost(&FuelType::Diesel), 4.0);
        assert_eq!(loaded.metrics.emission_factor(&FuelType::Gasoline), 8.89);
        assert_eq!(loaded.metrics.unit_cost(&FuelType::Gasoline), 3.25);
    }

    #[test]
    fn test_metrics_section_without_unit_cost() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"metrics": {"emission_factor": {"Biodiesel": 9.46}}}"#,
        )
        .unwrap();

        let loaded = Config::load_layered(Some(&path)).unwrap();
        let biodiesel = FuelType::Unrecognized("Biodiesel".to_string());
        assert_eq!(loaded.metrics.emission_factor(&biodiesel), 9.46);
        assert_eq!(loaded.metrics.unit_cost(&biodiesel), 0.0);
        assert_eq!(loaded.metrics.unit_cost(&FuelType::Diesel), 3.50);
    }

    #[test]
    fn test_single_bound_override_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"quality_rules": {"fuel_consumption": {"gallons_consumed": {"min": 0, "max": 250}}}}"#,
        )
        .unwrap();

        let loaded = Config::load_layered(Some(&path)).unwrap();
        let rules = &loaded.quality_rules;
        assert_eq!(
            rules.fuel_consumption_bounds(NumericField::GallonsConsumed),
            Some(&FieldBounds::new(0.0, 250.0))
        );
        assert_eq!(
            rules.fuel_consumption_bounds(NumericField::HoursOperated),
            Some(&FieldBounds::new(0.0, 24.0))
        );
    }

    #[test]
    fn test_fuel_labels_match_case_insensitively() {
        let tables = MetricsTables::default().with_emission_factor("Biodiesel", 9.46);
        let lower = FuelType::Unrecognized("biodiesel".to_string());
        assert_eq!(tables.emission_factor(&lower), 9.46);

        // A differently-cased key replaces the built-in entry
        let tables = MetricsTables::default().with_unit_cost("diesel", 4.10);
        assert_eq!(tables.unit_cost(&FuelType::Diesel), 4.10);
        assert_eq!(tables.unit_cost.len(), 2);

        let parsed: MetricsTables =
            serde_json::from_str(r#"{"emission_factor": {"DIESEL": 12.0}}"#).unwrap();
        assert_eq!(parsed.emission_factor(&FuelType::Diesel), 12.0);
    }

    #[test]
    fn test_config_validation_rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration { .. })
        ));

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::from_file(Path::new("/nonexistent/fuel-metrics.json"));
        assert!(matches!(result, Err(Error::FileNotFound { .. })));
    }

    #[test]
    fn test_malformed_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(Error::Serialization { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("FUEL_METRICS_INPUT", "/tmp/in.csv"),
            ("FUEL_METRICS_ISSUE_LOG", "/tmp/issues.jsonl"),
        ]);

        let mut config = Config::default();
        config.apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.pipeline.input_path, PathBuf::from("/tmp/in.csv"));
        assert_eq!(
            config.pipeline.output_path,
            PathBuf::from(DEFAULT_OUTPUT_FILE)
        );
        assert_eq!(
            config.pipeline.issue_log_path,
            Some(PathBuf::from("/tmp/issues.jsonl"))
        );
    }
}
