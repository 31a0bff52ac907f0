use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use doppler_core::screening::{calculate_lowball, LowballInput};

use crate::input;

/// Arguments for the lowball statistic
#[derive(Args)]
pub struct LowballArgs {
    /// Comma-separated sample, e.g. 0.12,0.18,0.09
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub values: Vec<Decimal>,

    /// Path to JSON input file (overrides --values)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_lowball(args: LowballArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lowball_input: LowballInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if !args.values.is_empty() {
        LowballInput { values: args.values }
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--values is required (or provide --input)".into());
    };

    let result = calculate_lowball(&lowball_input)?;
    Ok(serde_json::to_value(result)?)
}
