use clap::Args;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

use doppler_core::codes::CodeTable;

use crate::commands::load_codes;

/// Arguments for code-table inspection
#[derive(Args)]
pub struct CodesArgs {
    /// Path to the code table CSV
    #[arg(long)]
    pub codes: String,

    /// Look up a single specific code
    #[arg(long)]
    pub code: Option<String>,
}

pub fn run_codes(args: CodesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = load_codes(&args.codes)?;
    match args.code {
        Some(code) => Ok(lookup(&table, &code)),
        None => Ok(summarize(&table)),
    }
}

fn lookup(table: &CodeTable, code: &str) -> Value {
    let known = table.get(code).is_some();
    let entry = table.lookup(code);
    json!({
        "result": {
            "code": entry.code,
            "category": entry.category.as_code(),
            "sign": entry.sign.as_i8(),
            "description": entry.description,
            "known": known,
        }
    })
}

/// Entry counts per category, plus codes defined more than once.
fn summarize(table: &CodeTable) -> Value {
    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for entry in table.entries() {
        *categories.entry(entry.category.as_code().to_string()).or_default() += 1;
        if !seen.insert(entry.code.as_str()) {
            duplicates.insert(entry.code.as_str());
        }
    }

    let mut warnings = Vec::new();
    if !duplicates.is_empty() {
        warnings.push(format!(
            "Codes defined more than once, first definition used: {}",
            duplicates.iter().copied().collect::<Vec<_>>().join(", ")
        ));
    }

    json!({
        "result": {
            "entries": table.len(),
            "categories": categories,
        },
        "warnings": warnings,
    })
}
