//! Data models for fuel metrics processing
//!
//! This module contains the core data structures for fuel-consumption records,
//! their enriched (derived-metric) form, and the quality issues raised against them.

use crate::config::FieldBounds;
use crate::constants::{MISSING_DATA_ISSUE, OUT_OF_BOUNDS_SUFFIX, OUTLIER_SUFFIX, fields};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Categorical Values
// =============================================================================

/// Normalize a categorical label for lenient matching
fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fuel burned by the equipment
///
/// Labels that are not recognized are preserved rather than rejected so that a
/// single bad categorical value cannot abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FuelType {
    Diesel,
    Gasoline,
    Unrecognized(String),
}

impl FuelType {
    /// Parse a fuel label, returning `None` for empty text
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(match normalize_label(trimmed).as_str() {
            "diesel" => Self::Diesel,
            "gasoline" => Self::Gasoline,
            _ => Self::Unrecognized(trimmed.to_string()),
        })
    }

    /// Canonical label, used as the metric table key
    pub fn as_str(&self) -> &str {
        match self {
            Self::Diesel => "Diesel",
            Self::Gasoline => "Gasoline",
            Self::Unrecognized(label) => label,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<String> for FuelType {
    fn from(label: String) -> Self {
        Self::from_label(&label).unwrap_or(Self::Unrecognized(label))
    }
}

impl From<FuelType> for String {
    fn from(fuel_type: FuelType) -> Self {
        fuel_type.as_str().to_string()
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of equipment that consumed the fuel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EquipmentType {
    Generator,
    Vehicle,
    LightingTruck,
    Unrecognized(String),
}

impl EquipmentType {
    /// Parse an equipment label, returning `None` for empty text
    ///
    /// "Lighting Truck", "lighting_truck" and "LightingTruck" are all accepted.
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }

        Some(match normalize_label(trimmed).as_str() {
            "generator" => Self::Generator,
            "vehicle" => Self::Vehicle,
            "lightingtruck" => Self::LightingTruck,
            _ => Self::Unrecognized(trimmed.to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Generator => "Generator",
            Self::Vehicle => "Vehicle",
            Self::LightingTruck => "Lighting Truck",
            Self::Unrecognized(label) => label,
        }
    }
}

impl From<String> for EquipmentType {
    fn from(label: String) -> Self {
        Self::from_label(&label).unwrap_or(Self::Unrecognized(label))
    }
}

impl From<EquipmentType> for String {
    fn from(equipment_type: EquipmentType) -> Self {
        equipment_type.as_str().to_string()
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Fuel Record Structure
// =============================================================================

/// One fuel-consumption measurement event
///
/// Every field is optional because raw batches may be incomplete; completeness of
/// the critical fields is judged by the quality rule engine, not at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuelRecord {
    /// Storage row key of the measurement, carried into per-record issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    /// Production the fuel was consumed for (critical)
    #[serde(default)]
    pub production_id: Option<String>,

    /// Calendar date of the measurement (critical)
    #[serde(default)]
    pub date_recorded: Option<NaiveDate>,

    #[serde(default)]
    pub equipment_type: Option<EquipmentType>,

    #[serde(default)]
    pub fuel_type: Option<FuelType>,

    /// Gallons of fuel consumed (critical)
    #[serde(default)]
    pub gallons_consumed: Option<f64>,

    /// Hours the equipment ran, expected in [0, 24]
    #[serde(default)]
    pub hours_operated: Option<f64>,
}

impl FuelRecord {
    /// Create a record with all critical fields present
    pub fn new(
        production_id: impl Into<String>,
        date_recorded: NaiveDate,
        gallons_consumed: f64,
    ) -> Self {
        Self {
            production_id: Some(production_id.into()),
            date_recorded: Some(date_recorded),
            gallons_consumed: Some(gallons_consumed),
            ..Default::default()
        }
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_fuel_type(mut self, fuel_type: FuelType) -> Self {
        self.fuel_type = Some(fuel_type);
        self
    }

    pub fn with_equipment_type(mut self, equipment_type: EquipmentType) -> Self {
        self.equipment_type = Some(equipment_type);
        self
    }

    pub fn with_hours_operated(mut self, hours_operated: f64) -> Self {
        self.hours_operated = Some(hours_operated);
        self
    }

    /// Critical fields absent from this record, in declaration order
    pub fn missing_critical_fields(&self) -> Vec<CriticalField> {
        CriticalField::ALL
            .into_iter()
            .filter(|field| field.is_missing(self))
            .collect()
    }

    /// True when production id, date and gallons are all present
    pub fn is_critically_complete(&self) -> bool {
        CriticalField::ALL
            .iter()
            .all(|field| !field.is_missing(self))
    }
}

/// Numeric fields subject to statistical outlier checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericField {
    GallonsConsumed,
    HoursOperated,
}

impl NumericField {
    /// Checked fields, in issue emission order
    pub const ALL: [NumericField; 2] = [Self::GallonsConsumed, Self::HoursOperated];

    pub fn name(self) -> &'static str {
        match self {
            Self::GallonsConsumed => fields::GALLONS_CONSUMED,
            Self::HoursOperated => fields::HOURS_OPERATED,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    /// Read this field from a record
    pub fn value(self, record: &FuelRecord) -> Option<f64> {
        match self {
            Self::GallonsConsumed => record.gallons_consumed,
            Self::HoursOperated => record.hours_operated,
        }
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fields without which a record is not usable for downstream metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriticalField {
    ProductionId,
    DateRecorded,
    GallonsConsumed,
}

impl CriticalField {
    /// Critical fields, in issue emission order
    pub const ALL: [CriticalField; 3] = [
        Self::ProductionId,
        Self::DateRecorded,
        Self::GallonsConsumed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ProductionId => fields::PRODUCTION_ID,
            Self::DateRecorded => fields::DATE_RECORDED,
            Self::GallonsConsumed => fields::GALLONS_CONSUMED,
        }
    }

    pub fn is_missing(self, record: &FuelRecord) -> bool {
        match self {
            Self::ProductionId => record.production_id.is_none(),
            Self::DateRecorded => record.date_recorded.is_none(),
            Self::GallonsConsumed => record.gallons_consumed.is_none(),
        }
    }
}

// =============================================================================
// Enriched Record Structure
// =============================================================================

/// A fuel record with its derived environmental and cost metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: FuelRecord,

    /// Carbon emissions in kg CO2
    pub carbon_emissions_kg: f64,

    /// Fuel cost in USD
    pub fuel_cost_usd: f64,
}

impl EnrichedRecord {
    pub fn new(record: FuelRecord, carbon_emissions_kg: f64, fuel_cost_usd: f64) -> Self {
        Self {
            record,
            carbon_emissions_kg,
            fuel_cost_usd,
        }
    }

    pub fn record(&self) -> &FuelRecord {
        &self.record
    }
}

// =============================================================================
// Quality Issues
// =============================================================================

/// Severity of a quality finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(label)
    }
}

/// Kind of quality finding
///
/// Serialized as its label, e.g. `gallons_consumed_outlier` or `missing_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IssueType {
    /// Value outside the IQR fences of its batch
    Outlier(NumericField),
    /// Value outside the configured min/max rule bounds
    OutOfBounds(NumericField),
    /// A critical field is absent from one or more records
    MissingData,
}

impl IssueType {
    pub fn label(&self) -> String {
        match self {
            Self::Outlier(field) => format!("{}{}", field.name(), OUTLIER_SUFFIX),
            Self::OutOfBounds(field) => format!("{}{}", field.name(), OUT_OF_BOUNDS_SUFFIX),
            Self::MissingData => MISSING_DATA_ISSUE.to_string(),
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<IssueType> for String {
    fn from(issue_type: IssueType) -> Self {
        issue_type.label()
    }
}

impl TryFrom<String> for IssueType {
    type Error = Error;

    fn try_from(label: String) -> Result<Self> {
        if label == MISSING_DATA_ISSUE {
            return Ok(Self::MissingData);
        }

        let parsed = if let Some(name) = label.strip_suffix(OUT_OF_BOUNDS_SUFFIX) {
            NumericField::from_name(name).map(Self::OutOfBounds)
        } else if let Some(name) = label.strip_suffix(OUTLIER_SUFFIX) {
            NumericField::from_name(name).map(Self::Outlier)
        } else {
            None
        };

        parsed.ok_or_else(|| Error::data_validation(format!("Unknown issue type '{}'", label)))
    }
}

/// A single quality finding produced by one validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// Record the finding applies to; absent for batch-level findings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub issue_type: IssueType,
    pub issue_description: String,
    pub severity: Severity,
}

impl QualityIssue {
    /// Per-record IQR outlier finding
    pub fn outlier(field: NumericField, value: f64, record_id: Option<String>) -> Self {
        Self {
            record_id,
            issue_type: IssueType::Outlier(field),
            issue_description: format!("{} value {:?} is outside normal range", field, value),
            severity: Severity::Medium,
        }
    }

    /// Per-record configured-bounds finding
    pub fn out_of_bounds(
        field: NumericField,
        value: f64,
        bounds: &FieldBounds,
        record_id: Option<String>,
    ) -> Self {
        Self {
            record_id,
            issue_type: IssueType::OutOfBounds(field),
            issue_description: format!(
                "{} value {:?} is outside configured bounds [{:?}, {:?}]",
                field, value, bounds.min, bounds.max
            ),
            severity: Severity::Low,
        }
    }

    /// Batch-level completeness finding
    pub fn missing_data(field: CriticalField, count: usize) -> Self {
        Self {
            record_id: None,
            issue_type: IssueType::MissingData,
            issue_description: format!("Missing {} in {} records", field.name(), count),
            severity: Severity::High,
        }
    }

    pub fn is_record_level(&self) -> bool {
        !matches!(self.issue_type, IssueType::MissingData)
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.severity, self.issue_description)?;
        if let Some(record_id) = &self.record_id {
            write!(f, " (record {})", record_id)?;
        }
        Ok(())
    }
}
