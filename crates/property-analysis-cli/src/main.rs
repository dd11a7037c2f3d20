mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::analysis::{AnalyzeArgs, UpdateArgs};
use commands::loan::LoanArgs;
use property_analysis_core::config::AnalysisConfig;

/// Rental property investment analysis
#[derive(Parser)]
#[command(
    name = "pfa",
    version,
    about = "Rental property investment analysis",
    long_about = "A CLI for analyzing rental property deals with decimal precision. \
                  Computes NOI, cap rate, cash-on-cash return, DSCR and GRM, and \
                  reconciles partial edits against stored analyses."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Path to a JSON/YAML file of warning thresholds
    #[arg(long, global = true)]
    config: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a property from flags, a snapshot file, or stdin
    Analyze(AnalyzeArgs),
    /// Apply a partial edit to a stored snapshot and reconcile its metrics
    Update(UpdateArgs),
    /// Monthly payment and annual debt service for a fixed-rate loan
    DebtService(LoanArgs),
    /// Year-by-year amortization schedule
    Schedule(LoanArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

/// Debug level for this binary's own events (target `pfa::...`).
const VERBOSE_FILTER: &str = concat!(env!("CARGO_CRATE_NAME"), "=debug");

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(VERBOSE_FILTER))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the result document
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&str>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => input::file::read_document::<AnalysisConfig>(path)?,
        None => AnalysisConfig::default(),
    };
    config.validate()?;
    tracing::debug!(?config, "loaded analysis thresholds");
    Ok(config)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> =
        load_config(cli.config.as_deref()).and_then(|config| match cli.command {
            Commands::Analyze(args) => commands::analysis::run_analyze(args, &config),
            Commands::Update(args) => commands::analysis::run_update(args, &config),
            Commands::DebtService(args) => commands::loan::run_debt_service(args),
            Commands::Schedule(args) => commands::loan::run_schedule(args),
            Commands::Version => {
                println!("pfa {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
        });

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
