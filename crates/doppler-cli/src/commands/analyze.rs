use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::Path;

use doppler_core::report::StockReport;
use doppler_core::stock::Stock;
use doppler_core::ComputationOutput;

use crate::commands::{apply_overrides, load_codes, load_config, symbol_from_path, WindowPolicyArg};
use crate::input;

/// Arguments for a single-stock valuation
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the statement table CSV
    #[arg(long)]
    pub statement: String,

    /// Path to the code table CSV
    #[arg(long)]
    pub codes: String,

    /// Ticker symbol (defaults to the statement file name)
    #[arg(long)]
    pub symbol: Option<String>,

    /// Company name (defaults to the symbol)
    #[arg(long)]
    pub name: Option<String>,

    /// Market price per share
    #[arg(long)]
    pub price: Option<Decimal>,

    /// YAML or JSON configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Years in the trailing average of return on PPE
    #[arg(long)]
    pub smoothing_window: Option<usize>,

    /// Treatment of undefined returns inside the smoothing window
    #[arg(long, value_enum)]
    pub window_policy: Option<WindowPolicyArg>,

    /// Print the full analysis instead of the report
    #[arg(long)]
    pub full: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config.valuation, args.smoothing_window, args.window_policy);

    let codes = load_codes(&args.codes)?;
    let statement_path = input::file::resolve_path(&args.statement)?;
    let rows = input::file::read_csv_rows(&statement_path)?;

    let symbol = args
        .symbol
        .or_else(|| symbol_from_path(Path::new(&args.statement)))
        .ok_or("--symbol is required when the statement file name is not a symbol")?;
    let name = args.name.unwrap_or_else(|| symbol.clone());

    let stock = Stock::from_rows(&symbol, &name, args.price, &rows, &codes)?;
    let output = stock.analyze(&config.valuation)?;

    if args.full {
        return Ok(serde_json::to_value(output)?);
    }

    let today = chrono::Local::now().date_naive();
    let report = ComputationOutput {
        result: StockReport::from_analysis(&output.result, today),
        methodology: output.methodology,
        assumptions: output.assumptions,
        warnings: output.warnings,
        metadata: output.metadata,
    };
    Ok(serde_json::to_value(report)?)
}
