//! Command implementations for the fuel metrics CLI
//!
//! Each subcommand loads the layered configuration, wires the file-backed
//! adapters into a [`MetricsPipeline`] and prints its results in the requested
//! format. Cycles always run on the blocking pool.

use crate::app::adapters::csv_source::CsvSource;
use crate::app::adapters::issue_log::JsonLinesReporter;
use crate::app::adapters::parquet_sink::ParquetSink;
use crate::app::models::{QualityIssue, Severity};
use crate::app::services::pipeline::{CycleReport, MetricsPipeline};
use crate::app::services::quality_rules::{IssueReporter, QualityRuleEngine, TracingReporter};
use crate::cli::args::{Args, Commands, OutputFormat, RunArgs, ValidateArgs, WatchArgs};
use crate::config::Config;
use crate::{Error, Result};
use anyhow::Context;
use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Process exit code for a failed cycle
pub const EXIT_FAILURE: i32 = 1;

/// Process exit code after Ctrl-C interrupted a one-shot command
pub const EXIT_INTERRUPTED: i32 = 130;

/// Main command runner
///
/// Returns the process exit code. `run` and `validate` are abandoned on Ctrl-C;
/// `watch` finishes its current cycle and then stops.
pub async fn run(args: Args) -> anyhow::Result<i32> {
    match args.get_command() {
        Commands::Watch(watch_args) => watch_command(&args, &watch_args).await,
        command => {
            tokio::select! {
                result = run_once(&args, command) => result,
                _ = shutdown_signal() => {
                    let interrupted = Error::processing_interrupted("Interrupted by user");
                    eprintln!("\n{}", interrupted);
                    Ok(EXIT_INTERRUPTED)
                }
            }
        }
    }
}

async fn run_once(args: &Args, command: Commands) -> anyhow::Result<i32> {
    match command {
        Commands::Run(run_args) => run_command(args, &run_args).await,
        Commands::Validate(validate_args) => validate_command(args, &validate_args).await,
        Commands::Watch(watch_args) => watch_command(args, &watch_args).await,
    }
}

/// Resolves when Ctrl-C is received; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl-C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// Setup
// =============================================================================

/// Set up structured logging; `RUST_LOG` overrides `log_level` when set
fn setup_logging(quiet: bool, log_level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fuel_metrics={}", log_level)));

    let initialized = if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if initialized.is_err() {
        debug!("Logging already initialized");
    } else {
        debug!("Logging initialized at level: {}", log_level);
    }
}

/// Load configuration using the layered approach (file -> env -> args)
pub fn load_configuration<F>(config_file: Option<&Path>, overrides: F) -> Result<Config>
where
    F: FnOnce(&mut Config),
{
    let default_config_path = if config_file.is_none() {
        Config::default_config_path().ok()
    } else {
        None
    };

    let config_file = config_file.or_else(|| {
        default_config_path
            .as_deref()
            .filter(|path| path.exists())
    });

    match config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment variables"),
    }

    let mut config = Config::load_layered(config_file)?;
    overrides(&mut config);
    config.validate()?;

    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Load configuration for a subcommand, then start logging at the resolved level
fn command_configuration<F>(args: &Args, overrides: F) -> anyhow::Result<Config>
where
    F: FnOnce(&mut Config),
{
    let config = load_configuration(args.config_file.as_deref(), |config| {
        overrides(config);
        config.logging.level = args.effective_log_level(&config.logging.level);
    })
    .context("Failed to load configuration")?;

    setup_logging(args.quiet, &config.logging.level);

    info!("Starting fuel metrics");
    debug!("Command line arguments: {:?}", args);
    debug!("Loaded configuration: {:?}", config);
    Ok(config)
}

/// Wire the CSV source, Parquet sink and issue reporters described by `config`
pub fn build_pipeline(config: &Config) -> Result<MetricsPipeline> {
    let source = CsvSource::new(&config.pipeline.input_path);
    let sink = ParquetSink::new(&config.pipeline.output_path);

    let mut reporters: Vec<Box<dyn IssueReporter>> = vec![Box::new(TracingReporter)];
    if let Some(path) = &config.pipeline.issue_log_path {
        reporters.push(Box::new(JsonLinesReporter::open(path)?));
    }

    Ok(MetricsPipeline::from_config(config, source, sink, reporters))
}

fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

// =============================================================================
// Run
// =============================================================================

async fn run_command(args: &Args, run_args: &RunArgs) -> anyhow::Result<i32> {
    run_args.validate()?;

    let config = command_configuration(args, |config| run_args.apply_to(config))?;

    run_single_cycle(&config, args.output_format, args.show_progress()).await
}

/// Run one cycle against the configured files and print its report
///
/// Returns [`EXIT_FAILURE`] when the cycle failed; quality warnings still exit 0.
pub async fn run_single_cycle(
    config: &Config,
    format: OutputFormat,
    show_progress: bool,
) -> anyhow::Result<i32> {
    let mut pipeline = build_pipeline(config).context("Failed to set up pipeline")?;

    let spinner = show_progress.then(|| {
        create_spinner(format!(
            "Processing {}",
            config.pipeline.input_path.display()
        ))
    });

    let report = tokio::task::spawn_blocking(move || pipeline.run_cycle())
        .await
        .context("Refresh cycle task did not complete")?;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match format {
        OutputFormat::Human => print_human_report(&report, config),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize cycle report")?
        ),
    }

    Ok(if report.is_success() { 0 } else { EXIT_FAILURE })
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => severity.to_string().bright_red().bold(),
        Severity::Medium => severity.to_string().bright_yellow(),
        Severity::Low => severity.to_string().bright_black(),
    }
}

fn print_issues(issues: &[QualityIssue]) {
    for issue in issues {
        let record = issue
            .record_id
            .as_deref()
            .map(|id| format!(" (record {})", id))
            .unwrap_or_default();
        println!(
            "   • {} {}{}",
            severity_label(issue.severity),
            issue.issue_description,
            record.bright_black()
        );
    }
}

fn print_human_report(report: &CycleReport, config: &Config) {
    let stats = &report.stats;

    if report.is_success() {
        println!("\n{}", "Refresh Cycle Complete".bright_green().bold());
    } else {
        println!("\n{}", "Refresh Cycle Failed".bright_red().bold());
        if let (Some(stage), Some(cause)) = (report.failed_stage(), report.failure_cause()) {
            println!("   {} during {}: {}", "Error".bright_red(), stage, cause);
        }
    }

    println!(
        "   Records extracted: {}",
        stats.records_extracted.to_string().bright_white().bold()
    );

    let issue_count = stats.issues_found.to_string();
    println!(
        "   Quality issues: {}",
        if stats.issues_found > 0 {
            issue_count.bright_yellow().bold()
        } else {
            issue_count.bright_white().bold()
        }
    );
    if stats.report_failures > 0 {
        println!(
            "   Issues not reported: {}",
            stats.report_failures.to_string().bright_red().bold()
        );
    }
    println!("   Quality score: {:.1}%", report.quality_score);

    if report.is_success() {
        let totals = &report.metrics.totals;
        println!(
            "   Records enriched: {}",
            stats.records_enriched.to_string().bright_white().bold()
        );
        println!("   Gallons consumed: {:.1}", totals.gallons);
        println!("   Carbon emissions: {:.2} kg CO2", totals.carbon_emissions_kg);
        println!("   Fuel cost: ${:.2}", totals.fuel_cost_usd);
        if let Some((fuel, emissions)) = report.metrics.top_emitting_fuel() {
            println!("   Top emitting fuel: {} ({:.2} kg CO2)", fuel, emissions);
        }
        println!(
            "   Output: {}",
            config.pipeline.output_path.display().to_string().bright_cyan()
        );
    }

    println!("   Elapsed: {}", HumanDuration(stats.elapsed));

    if !report.issues.is_empty() {
        println!("\n{}", "Quality Issues".bright_yellow().bold());
        print_issues(&report.issues);
    }
    println!();
}

// =============================================================================
// Validate
// =============================================================================

/// Result of a validate-only pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub input: PathBuf,
    pub records: usize,
    pub quality_score: f64,
    pub issues: Vec<QualityIssue>,
}

impl ValidationSummary {
    pub fn summary(&self) -> String {
        format!(
            "Validation Summary: {} records | {} quality issues | Quality score: {:.1}%",
            self.records,
            self.issues.len(),
            self.quality_score
        )
    }
}

/// Extract the configured input and run the quality rules without deriving or loading
pub fn validate_input(config: &Config) -> Result<ValidationSummary> {
    let records = CsvSource::new(&config.pipeline.input_path).read()?;
    let engine = QualityRuleEngine::new(Arc::new(config.quality_rules.clone()));

    let mut issues = engine.validate(&records);
    if config.pipeline.enforce_rule_bounds {
        issues.extend(engine.validate_bounds(&records));
    }

    Ok(ValidationSummary {
        input: config.pipeline.input_path.clone(),
        records: records.len(),
        quality_score: engine.quality_score(&records),
        issues,
    })
}

async fn validate_command(args: &Args, validate_args: &ValidateArgs) -> anyhow::Result<i32> {
    let config = command_configuration(args, |config| validate_args.apply_to(config))?;

    let spinner = args.show_progress().then(|| {
        create_spinner(format!(
            "Validating {}",
            config.pipeline.input_path.display()
        ))
    });

    let task_config = config.clone();
    let validated = tokio::task::spawn_blocking(move || validate_input(&task_config))
        .await
        .context("Validation task did not complete")?;

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let validation = validated.with_context(|| {
        format!(
            "Failed to validate '{}'",
            config.pipeline.input_path.display()
        )
    })?;
    info!("{}", validation.summary());

    match args.output_format {
        OutputFormat::Human => {
            println!("\n{}", "Validation Complete".bright_green().bold());
            println!(
                "   Input: {}",
                validation.input.display().to_string().bright_cyan()
            );
            println!(
                "   Records: {}",
                validation.records.to_string().bright_white().bold()
            );
            println!("   Quality score: {:.1}%", validation.quality_score);
            if validation.issues.is_empty() {
                println!("   {}", "No quality issues found".bright_green());
            } else {
                println!(
                    "   Quality issues: {}",
                    validation.issues.len().to_string().bright_yellow().bold()
                );
                print_issues(&validation.issues);
            }
            println!();
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&validation)
                .context("Failed to serialize validation summary")?
        ),
    }

    Ok(0)
}

// =============================================================================
// Watch
// =============================================================================

/// Counts of cycles run by the watch loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchSummary {
    pub cycles: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl WatchSummary {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Watch Summary: {} cycles | {} succeeded | {} failed",
            self.cycles, self.succeeded, self.failed
        )
    }
}

/// Run cycles every `period` until `shutdown` resolves or `max_cycles` have run
///
/// The first cycle starts immediately. A cycle is awaited to completion before
/// the next tick is taken, and `shutdown` is only observed between cycles.
pub async fn run_cycles<S, F>(
    mut pipeline: MetricsPipeline,
    period: Duration,
    max_cycles: Option<u64>,
    shutdown: S,
    mut on_report: F,
) -> anyhow::Result<WatchSummary>
where
    S: Future<Output = ()>,
    F: FnMut(&CycleReport),
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut summary = WatchSummary::default();

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutdown requested after {} cycles", summary.cycles);
                break;
            }
            _ = ticker.tick() => {}
        }

        let (returned, report) = tokio::task::spawn_blocking(move || {
            let report = pipeline.run_cycle();
            (pipeline, report)
        })
        .await
        .context("Refresh cycle task did not complete")?;
        pipeline = returned;

        summary.record(&report);
        on_report(&report);

        if max_cycles.is_some_and(|max| summary.cycles >= max) {
            info!("Reached {} cycles, stopping", summary.cycles);
            break;
        }
    }

    Ok(summary)
}

async fn watch_command(args: &Args, watch_args: &WatchArgs) -> anyhow::Result<i32> {
    watch_args.validate()?;

    let config = command_configuration(args, |config| watch_args.apply_to(config))?;

    let pipeline = build_pipeline(&config).context("Failed to set up pipeline")?;
    let period = Duration::from_secs(config.pipeline.refresh_interval_secs);
    let format = args.output_format;

    info!(
        "Watching {} every {}",
        config.pipeline.input_path.display(),
        HumanDuration(period)
    );
    if format == OutputFormat::Human && !args.quiet {
        println!(
            "{} {} every {} (Ctrl-C to stop)",
            "Watching".bright_green().bold(),
            config.pipeline.input_path.display().to_string().bright_cyan(),
            HumanDuration(period)
        );
    }

    let summary = run_cycles(
        pipeline,
        period,
        watch_args.max_cycles,
        shutdown_signal(),
        |report| print_cycle_line(report, format),
    )
    .await?;

    match format {
        OutputFormat::Human => println!("{}", summary.summary()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&summary).context("Failed to serialize watch summary")?
        ),
    }

    Ok(0)
}

fn print_cycle_line(report: &CycleReport, format: OutputFormat) {
    match format {
        OutputFormat::Human => {
            let line = report.summary();
            if report.is_success() {
                println!("{}", line.bright_green());
            } else {
                println!("{}", line.bright_red());
            }
        }
        OutputFormat::Json => match serde_json::to_string(report) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Failed to serialize cycle {} report: {}", report.cycle, e),
        },
    }
}
