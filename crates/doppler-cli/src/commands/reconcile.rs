use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use doppler_core::screening::{reconcile, ReconcileInput};

use crate::input;

/// Arguments for a decibel cross-check
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ReconcileArgs {
    /// Figure from the primary source
    #[arg(long)]
    pub primary: Option<Decimal>,

    /// Same figure from an independent source
    #[arg(long)]
    pub secondary: Option<Decimal>,

    /// Gap in dB at which the pair is suspect (default 2)
    #[arg(long)]
    pub threshold_db: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_reconcile(args: ReconcileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let reconcile_input: ReconcileInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if args.primary.is_none() && args.secondary.is_none() {
        input::stdin::read_stdin()?.ok_or("--primary and --secondary are required (or provide --input)")?
    } else {
        ReconcileInput {
            primary: args
                .primary
                .ok_or("--primary is required (or provide --input)")?,
            secondary: args
                .secondary
                .ok_or("--secondary is required (or provide --input)")?,
            threshold_db: args.threshold_db,
        }
    };

    let result = reconcile(&reconcile_input)?;
    Ok(serde_json::to_value(result)?)
}
