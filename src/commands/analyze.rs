//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Loads the ingestion config
//! 2. Ingests the trace (header, body, extraction, pivot)
//! 3. Detects bursts on the requested counter columns
//! 4. Prints a text summary and/or writes a JSON report

use super::ingest::{ingest_path, Trace};
use crate::output::{
    build_report, format_bursts, format_metadata, format_table, write_report, BurstRequest, Report,
};
use crate::utils::config::{load_config, DecodeErrorPolicy, IngestConfig, DEFAULT_MAX_ROWS};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Trace file to ingest
    pub trace_path: PathBuf,

    /// Optional TOML config with decode policy and extraction policies
    pub config_path: Option<PathBuf>,

    /// Overrides the config's decode-error policy
    pub on_decode_error: Option<DecodeErrorPolicy>,

    /// Series to show; empty means all
    pub series: Vec<String>,

    /// Counter columns to run burst detection on
    pub bursts: Vec<BurstRequest>,

    /// Output path for the JSON report (optional)
    pub output_json: Option<PathBuf>,

    /// Rows per table in the text summary (0 = all)
    pub max_rows: usize,

    /// Print text summary to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            trace_path: PathBuf::new(),
            config_path: None,
            on_decode_error: None,
            series: Vec::new(),
            bursts: Vec::new(),
            output_json: None,
            max_rows: DEFAULT_MAX_ROWS,
            print_summary: true,
        }
    }
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.trace_path.as_os_str().is_empty() {
        anyhow::bail!("Trace path cannot be empty");
    }

    if args.series.iter().any(|key| key.trim().is_empty()) {
        anyhow::bail!("Series keys cannot be empty");
    }

    if !args.print_summary && args.output_json.is_none() {
        anyhow::bail!("Nothing to do: summary disabled and no --output given");
    }

    Ok(())
}

/// Build the effective ingestion config: file first, then CLI overrides
pub fn resolve_config(args: &AnalyzeArgs) -> Result<IngestConfig> {
    let mut config = match &args.config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("{}", path.display()))?,
        None => IngestConfig::default(),
    };

    if let Some(policy) = args.on_decode_error {
        config.on_decode_error = policy;
    }

    debug!(
        "Effective config: on_decode_error={:?}, {} registered policies",
        config.on_decode_error,
        config.policies.len()
    );
    Ok(config)
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Missing or unreadable trace file
/// * Malformed header, or malformed record under `abort`
/// * Config or report file errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/4: Loading configuration...");
    let config = resolve_config(&args)?;

    info!("Step 2/4: Ingesting trace...");
    let trace = ingest_path(&args.trace_path, &config).map_err(|err| {
        let location = match err.line() {
            Some(line) => format!("{}:{}", args.trace_path.display(), line),
            None => args.trace_path.display().to_string(),
        };
        anyhow::Error::new(err).context(location)
    })?;

    info!("Step 3/4: Detecting bursts on {} column(s)...", args.bursts.len());
    let source = args.trace_path.display().to_string();
    let report = build_report(&trace, &source, &args.series, &args.bursts);

    info!("Step 4/4: Writing output...");
    if args.print_summary {
        print!("{}", render_summary(&trace, &report, args.max_rows));
    }

    if let Some(path) = &args.output_json {
        write_report(&report, path).context("Failed to write JSON report")?;
        info!("✓ Report written to: {}", path.display());
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Text summary: metadata, selected tables, bursts and diagnostics
pub fn render_summary(trace: &Trace, report: &Report<'_>, max_rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format_metadata(&trace.metadata));
    out.push('\n');

    for series in &report.series {
        if let Ok(table) = trace.series(&*series.key) {
            out.push_str(&format_table(table, max_rows));
        }
    }

    for burst in &report.bursts {
        out.push_str(&format_bursts(&burst.key, &burst.column, &burst.intervals));
    }

    let stats = &trace.stats;
    out.push_str(&format!(
        "{} records, {} series, {} malformed lines skipped, {} duplicate rows dropped\n",
        stats.records, stats.series, stats.malformed, stats.duplicates_dropped
    ));

    for diagnostic in &report.diagnostics {
        out.push_str(&format!("note: {}\n", diagnostic));
    }
    out
}
