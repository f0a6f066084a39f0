//! JSON-lines issue log
//!
//! Appends one serialized [`QualityIssue`] per line, so the log accumulates
//! findings across cycles and survives restarts.

use crate::app::models::QualityIssue;
use crate::app::services::quality_rules::IssueReporter;
use crate::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Issue reporter that appends to a JSON-lines file
#[derive(Debug)]
pub struct JsonLinesReporter {
    path: PathBuf,
    file: File,
}

impl JsonLinesReporter {
    /// Open the log for appending, creating it and its directory if needed
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::io(
                    format!("Failed to create issue log directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                Error::io(format!("Failed to open issue log '{}'", path.display()), e)
            })?;

        debug!("Appending quality issues to {}", path.display());
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IssueReporter for JsonLinesReporter {
    fn report(&mut self, issue: &QualityIssue) -> Result<()> {
        let line = serde_json::to_string(issue)
            .map_err(|e| Error::serialization("Failed to serialize quality issue", e))?;

        writeln!(self.file, "{}", line).map_err(|e| {
            Error::io(
                format!("Failed to append to issue log '{}'", self.path.display()),
                e,
            )
        })
    }
}

/// Read every issue from a JSON-lines log, skipping blank lines
pub fn read_issue_log(path: &Path) -> Result<Vec<QualityIssue>> {
    let file = File::open(path)
        .map_err(|e| Error::io(format!("Failed to open issue log '{}'", path.display()), e))?;

    let mut issues = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let issue = serde_json::from_str(&line).map_err(|e| {
            Error::serialization(
                format!("Invalid issue on line {} of '{}'", index + 1, path.display()),
                e,
            )
        })?;
        issues.push(issue);
    }

    Ok(issues)
}
