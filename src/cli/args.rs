//! Command line argument parsing for fuel metrics
//!
//! Global flags (config file, verbosity, output format) apply to every
//! subcommand. Path flags override the layered configuration when given.

use crate::config::Config;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fuel-consumption quality checks and carbon/cost metrics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fuel-metrics",
    version,
    about = "Validate production fuel records and derive carbon emission and fuel cost metrics",
    long_about = "Reads a batch of production fuel-consumption records, flags statistical \
                  outliers and missing critical fields, derives carbon emissions and fuel \
                  cost per record, and writes the enriched batch to Parquet."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path (JSON)
    #[arg(short, long = "config", global = true, help = "Configuration file path (JSON)")]
    pub config_file: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode - only errors
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    pub quiet: bool,

    /// Output format for results
    #[arg(
        long = "format",
        value_enum,
        default_value = "human",
        global = true,
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run one refresh cycle: CSV -> quality checks -> metrics -> Parquet
    Run(RunArgs),
    /// Extract and validate only; print the quality issues found
    Validate(ValidateArgs),
    /// Run refresh cycles on a fixed interval until interrupted
    Watch(WatchArgs),
}

/// Arguments shared by the commands that run full cycles
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct RunArgs {
    /// Input CSV file of fuel records
    #[arg(short, long, help = "Input CSV file of fuel records")]
    pub input: Option<PathBuf>,

    /// Output Parquet file for the enriched batch
    #[arg(short, long, help = "Output Parquet file for the enriched batch")]
    pub output: Option<PathBuf>,

    /// Append quality issues to this JSON-lines file
    #[arg(long, help = "Append quality issues to this JSON-lines file")]
    pub issue_log: Option<PathBuf>,

    /// Also flag values outside the configured rule bounds
    #[arg(long, help = "Also flag values outside the configured rule bounds")]
    pub enforce_bounds: bool,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct ValidateArgs {
    /// Input CSV file of fuel records
    #[arg(short, long, help = "Input CSV file of fuel records")]
    pub input: Option<PathBuf>,

    /// Also flag values outside the configured rule bounds
    #[arg(long, help = "Also flag values outside the configured rule bounds")]
    pub enforce_bounds: bool,
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct WatchArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Seconds between refresh cycles
    #[arg(long, help = "Seconds between refresh cycles (default: daily)")]
    pub interval: Option<u64>,

    /// Stop after this many cycles
    #[arg(long, help = "Stop after this many cycles")]
    pub max_cycles: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored output
    #[default]
    Human,
    /// JSON output for machine consumption
    Json,
}

impl Args {
    /// The subcommand to run; `run` with defaults when none is given
    pub fn get_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Get the log level based on verbosity
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Log level to run with: `-v`/`-q` win over the configured level
    pub fn effective_log_level(&self, configured: &str) -> String {
        if self.quiet || self.verbose > 0 {
            self.get_log_level().to_string()
        } else {
            configured.to_ascii_lowercase()
        }
    }

    /// Check if progress should be shown
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

impl RunArgs {
    /// Validate path arguments before any work starts
    pub fn validate(&self) -> Result<()> {
        if let Some(input) = &self.input {
            if input.is_dir() {
                return Err(Error::configuration(format!(
                    "Input '{}' is a directory, expected a CSV file",
                    input.display()
                )));
            }
        }
        if let Some(output) = &self.output {
            if output.is_dir() {
                return Err(Error::configuration(format!(
                    "Output '{}' is a directory, expected a Parquet file path",
                    output.display()
                )));
            }
        }
        Ok(())
    }

    /// Apply the flags that were given on top of the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.pipeline.input_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.pipeline.output_path = output.clone();
        }
        if let Some(issue_log) = &self.issue_log {
            config.pipeline.issue_log_path = Some(issue_log.clone());
        }
        if self.enforce_bounds {
            config.pipeline.enforce_rule_bounds = true;
        }
    }
}

impl ValidateArgs {
    pub fn apply_to(&self, config: &mut Config) {
        RunArgs {
            input: self.input.clone(),
            enforce_bounds: self.enforce_bounds,
            ..RunArgs::default()
        }
        .apply_to(config);
    }
}

impl WatchArgs {
    pub fn validate(&self) -> Result<()> {
        self.run.validate()?;
        if self.interval == Some(0) {
            return Err(Error::configuration(
                "Interval must be greater than 0 seconds",
            ));
        }
        if self.max_cycles == Some(0) {
            return Err(Error::configuration("Max cycles must be greater than 0"));
        }
        Ok(())
    }

    pub fn apply_to(&self, config: &mut Config) {
        self.run.apply_to(config);
        if let Some(interval) = self.interval {
            config.pipeline.refresh_interval_secs = interval;
        }
    }
}
