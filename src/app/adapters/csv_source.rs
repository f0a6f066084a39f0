//! CSV record source backed by polars
//!
//! Reads a materialized batch from a CSV file with a header row. Every column is
//! read as text and parsed leniently: missing columns, empty cells and values
//! that fail to parse all become absent fields, which the quality rules then
//! surface as `missing_data` where the field is critical.

use crate::app::models::{EquipmentType, FuelRecord, FuelType};
use crate::app::services::pipeline::RecordSource;
use crate::constants::{DATE_FORMAT, fields};
use crate::{Error, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Record source that re-reads a CSV file on every extraction
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole file
    pub fn read(&self) -> Result<Vec<FuelRecord>> {
        if !self.path.exists() {
            return Err(Error::extraction(format!(
                "Input file '{}' does not exist",
                self.path.display()
            )));
        }

        let df = LazyCsvReader::new(&self.path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| {
                Error::data_frame(format!("Failed to read CSV '{}'", self.path.display()), e)
            })?;

        debug!(
            "Read {} rows x {} columns from {}",
            df.height(),
            df.width(),
            self.path.display()
        );

        records_from_frame(&df)
    }
}

impl RecordSource for CsvSource {
    fn extract(&mut self) -> Result<Vec<FuelRecord>> {
        self.read()
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}

/// Text values of one column, trimmed, with empty cells as `None`
///
/// Returns `None` when the frame has no such column.
fn text_column(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };

    let column = column.cast(&DataType::String)?;
    let values = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|value| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
        .collect();

    Ok(Some(values))
}

fn cell(column: &Option<Vec<Option<String>>>, row: usize) -> Option<&str> {
    column.as_ref()?.get(row)?.as_deref()
}

/// Counts of present cells that could not be parsed
#[derive(Debug, Default)]
struct ParseFailures {
    dates: usize,
    numbers: usize,
}

impl ParseFailures {
    fn date(&mut self, text: Option<&str>) -> Option<NaiveDate> {
        let text = text?;
        let parsed = NaiveDate::parse_from_str(text, DATE_FORMAT).ok();
        if parsed.is_none() {
            debug!("Unparseable date '{}'", text);
            self.dates += 1;
        }
        parsed
    }

    fn number(&mut self, text: Option<&str>) -> Option<f64> {
        let text = text?;
        let parsed = text.parse::<f64>().ok().filter(|v| v.is_finite());
        if parsed.is_none() {
            debug!("Unparseable number '{}'", text);
            self.numbers += 1;
        }
        parsed
    }

    fn total(&self) -> usize {
        self.dates + self.numbers
    }
}

/// Convert a text frame into fuel records, one per row in row order
///
/// When the frame has no `record_id` column, 1-based row numbers are assigned.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<FuelRecord>> {
    let record_ids = text_column(df, fields::RECORD_ID)?;
    let production_ids = text_column(df, fields::PRODUCTION_ID)?;
    let dates = text_column(df, fields::DATE_RECORDED)?;
    let equipment = text_column(df, fields::EQUIPMENT_TYPE)?;
    let fuel = text_column(df, fields::FUEL_TYPE)?;
    let gallons = text_column(df, fields::GALLONS_CONSUMED)?;
    let hours = text_column(df, fields::HOURS_OPERATED)?;

    let mut failures = ParseFailures::default();
    let mut records = Vec::with_capacity(df.height());

    for row in 0..df.height() {
        let record_id = match &record_ids {
            Some(_) => cell(&record_ids, row).map(str::to_string),
            None => Some((row + 1).to_string()),
        };

        records.push(FuelRecord {
            record_id,
            production_id: cell(&production_ids, row).map(str::to_string),
            date_recorded: failures.date(cell(&dates, row)),
            equipment_type: cell(&equipment, row).and_then(EquipmentType::from_label),
            fuel_type: cell(&fuel, row).and_then(FuelType::from_label),
            gallons_consumed: failures.number(cell(&gallons, row)),
            hours_operated: failures.number(cell(&hours, row)),
        });
    }

    if failures.total() > 0 {
        warn!(
            "{} unparseable values treated as absent ({} dates, {} numbers)",
            failures.total(),
            failures.dates,
            failures.numbers
        );
    }

    Ok(records)
}
