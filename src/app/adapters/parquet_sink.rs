//! Parquet metrics sink backed by polars
//!
//! Writes each enriched batch as one Snappy-compressed Parquet file, replacing
//! the previous cycle's output. The file is written to a temporary sibling first
//! and renamed into place, so a failed write never leaves a partial file behind.

use crate::app::models::EnrichedRecord;
use crate::app::services::pipeline::MetricsSink;
use crate::constants::{DATE_FORMAT, fields};
use crate::{Error, Result};
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Metrics sink that writes the enriched batch to a Parquet file
#[derive(Debug, Clone)]
pub struct ParquetSink {
    path: PathBuf,
}

impl ParquetSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the batch, returning the number of rows written
    pub fn write(&self, batch: &[EnrichedRecord]) -> Result<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::io(
                    format!("Failed to create output directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let mut df = enriched_frame(batch)?;
        let temp_path = self.path.with_extension("parquet.tmp");

        let file = fs::File::create(&temp_path).map_err(|e| {
            Error::io(format!("Failed to create '{}'", temp_path.display()), e)
        })?;

        let written = ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df);

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::data_frame(
                format!("Failed to write Parquet '{}'", self.path.display()),
                e,
            ));
        }

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(Error::io(
                format!("Failed to move output into '{}'", self.path.display()),
                e,
            ));
        }

        debug!("Wrote {} rows to {}", df.height(), self.path.display());
        Ok(df.height())
    }
}

impl MetricsSink for ParquetSink {
    fn load(&mut self, batch: &[EnrichedRecord]) -> Result<()> {
        let rows = self.write(batch)?;
        info!("Loaded {} enriched records into {}", rows, self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Parquet file {}", self.path.display())
    }
}

/// Build the output frame: all record fields plus the derived metrics
///
/// Dates are written as `YYYY-MM-DD` text; absent values are nulls.
pub fn enriched_frame(batch: &[EnrichedRecord]) -> Result<DataFrame> {
    let text = |f: fn(&EnrichedRecord) -> Option<String>| -> Vec<Option<String>> {
        batch.iter().map(f).collect()
    };

    let columns = vec![
        Column::new(
            fields::RECORD_ID.into(),
            text(|e| e.record.record_id.clone()),
        ),
        Column::new(
            fields::PRODUCTION_ID.into(),
            text(|e| e.record.production_id.clone()),
        ),
        Column::new(
            fields::DATE_RECORDED.into(),
            text(|e| {
                e.record
                    .date_recorded
                    .map(|d| d.format(DATE_FORMAT).to_string())
            }),
        ),
        Column::new(
            fields::EQUIPMENT_TYPE.into(),
            text(|e| e.record.equipment_type.as_ref().map(|t| t.as_str().to_string())),
        ),
        Column::new(
            fields::FUEL_TYPE.into(),
            text(|e| e.record.fuel_type.as_ref().map(|t| t.as_str().to_string())),
        ),
        Column::new(
            fields::GALLONS_CONSUMED.into(),
            batch
                .iter()
                .map(|e| e.record.gallons_consumed)
                .collect::<Vec<Option<f64>>>(),
        ),
        Column::new(
            fields::HOURS_OPERATED.into(),
            batch
                .iter()
                .map(|e| e.record.hours_operated)
                .collect::<Vec<Option<f64>>>(),
        ),
        Column::new(
            fields::CARBON_EMISSIONS_KG.into(),
            batch
                .iter()
                .map(|e| e.carbon_emissions_kg)
                .collect::<Vec<f64>>(),
        ),
        Column::new(
            fields::FUEL_COST_USD.into(),
            batch.iter().map(|e| e.fuel_cost_usd).collect::<Vec<f64>>(),
        ),
    ];

    DataFrame::new(columns)
        .map_err(|e| Error::data_frame("Failed to build enriched data frame", e))
}
