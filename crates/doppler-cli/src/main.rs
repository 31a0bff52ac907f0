mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::analyze::AnalyzeArgs;
use commands::codes::CodesArgs;
use commands::lowball::LowballArgs;
use commands::reconcile::ReconcileArgs;
use commands::screen::ScreenArgs;

/// Doppler value screening of financial statements
#[derive(Parser)]
#[command(
    name = "doppler",
    version,
    about = "Doppler value screening of financial statements",
    long_about = "Normalizes line-item financial statements through a code table, resolves \
                  the capital structure under two convertible-security assumptions and \
                  estimates intrinsic value per share from the return on PPE. Screens whole \
                  directories of statements against an exchange listing."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Value one stock from its statement table
    Analyze(AnalyzeArgs),
    /// Value and screen every statement in a directory
    Screen(ScreenArgs),
    /// Lowball statistic of a small sample
    Lowball(LowballArgs),
    /// Decibel cross-check of two independently sourced figures
    Reconcile(ReconcileArgs),
    /// Validate a code table or look up one code
    Codes(CodesArgs),
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

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args),
        Commands::Screen(args) => commands::screen::run_screen(args),
        Commands::Lowball(args) => commands::lowball::run_lowball(args),
        Commands::Reconcile(args) => commands::reconcile::run_reconcile(args),
        Commands::Codes(args) => commands::codes::run_codes(args),
        Commands::Version => {
            println!("doppler {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

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
