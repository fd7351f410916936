mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::amount::ParseAmountArgs;
use commands::analysis::AnalyzeArgs;
use commands::scenarios::SensitivityArgs;
use commands::valuation::{FyPeArgs, IntrinsicPeArgs, OvervaluationArgs};

/// Intrinsic P/E valuation from fundamentals
#[derive(Parser)]
#[command(
    name = "ipe",
    version,
    about = "Intrinsic P/E valuation from fundamentals",
    long_about = "Computes a company's intrinsic price-to-earnings multiple with a \
                  high-growth, fade and terminal model, compares it with the market \
                  multiples and reports the degree of over-valuation."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation details to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a grouped-digit amount such as "1,03,456"
    ParseAmount(ParseAmountArgs),
    /// Full-year P/E from market capitalisation and net profit
    FyPe(FyPeArgs),
    /// Intrinsic P/E from the valuation parameters
    IntrinsicPe(IntrinsicPeArgs),
    /// Degree of over-valuation against an intrinsic P/E
    Overvaluation(OvervaluationArgs),
    /// Full report from a company's raw metrics
    Analyze(AnalyzeArgs),
    /// Two-parameter intrinsic P/E sensitivity grid
    Sensitivity(SensitivityArgs),
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

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::ParseAmount(args) => commands::amount::run_parse_amount(args),
        Commands::FyPe(args) => commands::valuation::run_fy_pe(args),
        Commands::IntrinsicPe(args) => commands::valuation::run_intrinsic_pe(args),
        Commands::Overvaluation(args) => commands::valuation::run_overvaluation(args),
        Commands::Analyze(args) => commands::analysis::run_analyze(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Version => {
            println!("ipe {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
