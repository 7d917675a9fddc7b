//! qlog-series CLI
//!
//! Ingests a qlog-style trace and prints its per-field time series,
//! optionally writing a JSON report for charting front-ends.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use std::process::ExitCode;

use qlog_series::commands::{
    display_policies, display_version, execute_analyze, resolve_config, validate_args, AnalyzeArgs,
};
use qlog_series::output::BurstRequest;
use qlog_series::utils::config::{DecodeErrorPolicy, DEFAULT_MAX_ROWS};

/// qlog-series - per-field time series from transport event traces
#[derive(Parser, Debug)]
#[command(name = "qlog-series")]
#[command(about, long_about = None)]
struct Cli {
    /// Path to the trace file
    #[arg(required_unless_present_any = ["policies", "version"])]
    trace: Option<PathBuf>,

    /// TOML file with decode policy and extraction policies
    #[arg(short, long, env = "QLOG_SERIES_CONFIG")]
    config: Option<PathBuf>,

    /// What to do with malformed body lines (overrides the config file)
    #[arg(long, value_enum)]
    on_decode_error: Option<DecodeErrorPolicy>,

    /// Only show these series (repeatable)
    #[arg(short, long = "series", value_name = "KEY")]
    series: Vec<String>,

    /// Detect bursts on a counter column (repeatable)
    #[arg(short, long = "bursts", value_name = "KEY=COLUMN")]
    bursts: Vec<BurstRequest>,

    /// Output path for a JSON report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rows per table in the summary (0 = all)
    #[arg(long, default_value_t = DEFAULT_MAX_ROWS)]
    max_rows: usize,

    /// Do not print the text summary
    #[arg(short, long)]
    quiet: bool,

    /// Print the effective extraction policies and exit
    #[arg(long)]
    policies: bool,

    /// Display version information
    #[arg(short = 'V', long)]
    version: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.version {
        display_version();
        return Ok(());
    }

    let args = AnalyzeArgs {
        trace_path: cli.trace.unwrap_or_default(),
        config_path: cli.config,
        on_decode_error: cli.on_decode_error,
        series: cli.series,
        bursts: cli.bursts,
        output_json: cli.output,
        max_rows: cli.max_rows,
        print_summary: !cli.quiet,
    };

    if cli.policies {
        display_policies(&resolve_config(&args)?);
        return Ok(());
    }

    // Validate args first
    validate_args(&args)?;

    execute_analyze(args)
}
