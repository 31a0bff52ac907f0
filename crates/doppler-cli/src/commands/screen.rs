use clap::Args;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use doppler_core::codes::CodeTable;
use doppler_core::config::DopplerConfig;
use doppler_core::screening::{partition, screen, ScreenVerdict};
use doppler_core::stock::Stock;
use doppler_core::{Cell, Money};

use crate::commands::{apply_overrides, load_codes, load_config, WindowPolicyArg};
use crate::input;
use crate::input::listing::ListedStock;

/// Arguments for a batch screen
#[derive(Args)]
pub struct ScreenArgs {
    /// Directory of statement CSVs, one per symbol
    #[arg(long)]
    pub statements: String,

    /// Path to the code table CSV (defaults to codes.csv in the statement directory)
    #[arg(long)]
    pub codes: Option<String>,

    /// Exchange listing CSVs supplying names and prices
    #[arg(long, required = true, num_args = 1..)]
    pub listing: Vec<String>,

    /// YAML or JSON configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Years in the trailing average of return on PPE
    #[arg(long)]
    pub smoothing_window: Option<usize>,

    /// Treatment of undefined returns inside the smoothing window
    #[arg(long, value_enum)]
    pub window_policy: Option<WindowPolicyArg>,

    /// Only list stocks that pass every check
    #[arg(long)]
    pub passing_only: bool,

    /// Emit full verdicts instead of one flat row per stock
    #[arg(long)]
    pub detailed: bool,
}

/// One stock of the screen, flattened for tables and CSV.
#[derive(Debug, Serialize)]
struct ScreenRow {
    symbol: String,
    name: String,
    price: Option<Money>,
    intrinsic_value: Cell,
    earnings: Cell,
    price_to_earnings: Cell,
    earnings_yield: Cell,
    price_to_book: Cell,
    return_lowball: Cell,
    return_smoothed: Cell,
    assets_gap_db: Cell,
    revenue_gap_db: Cell,
    ppe_growth_dev_db: Cell,
    assets_suspect: bool,
    revenue_suspect: bool,
    ppe_suspect: bool,
    return_too_low: bool,
    no_intrinsic_value: bool,
    passes: bool,
}

impl From<&ScreenVerdict> for ScreenRow {
    fn from(v: &ScreenVerdict) -> Self {
        Self {
            symbol: v.symbol.clone(),
            name: v.name.clone(),
            price: v.price,
            intrinsic_value: v.intrinsic_value,
            earnings: v.earnings,
            price_to_earnings: v.price_to_earnings,
            earnings_yield: v.earnings_yield,
            price_to_book: v.price_to_book,
            return_lowball: v.return_stats.as_ref().map(|s| s.lowball),
            return_smoothed: v.return_smoothed,
            assets_gap_db: v.assets_check.as_ref().and_then(|c| c.gap_db),
            revenue_gap_db: v.revenue_check.as_ref().and_then(|c| c.gap_db),
            ppe_growth_dev_db: v.ppe_growth.std_dev_db,
            assets_suspect: v.flags.assets_suspect,
            revenue_suspect: v.flags.revenue_suspect,
            ppe_suspect: v.flags.ppe_suspect,
            return_too_low: v.flags.return_too_low,
            no_intrinsic_value: v.flags.no_intrinsic_value,
            passes: v.passes,
        }
    }
}

pub fn run_screen(args: ScreenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config.valuation, args.smoothing_window, args.window_policy);
    config.validate()?;

    let codes_path = match args.codes {
        Some(path) => path,
        None => Path::new(&args.statements)
            .join("codes.csv")
            .to_string_lossy()
            .into_owned(),
    };
    let codes = load_codes(&codes_path)?;
    let listing = input::listing::read_listings(&args.listing)?;
    let files = input::file::statement_files(&args.statements)?;

    let candidates: Vec<(&PathBuf, &ListedStock)> = files
        .iter()
        .filter_map(|(symbol, path)| match listing.get(symbol) {
            Some(listed) => Some((path, listed)),
            None => {
                tracing::warn!(symbol = %symbol, "not in any listing, skipping");
                None
            }
        })
        .collect();

    let verdicts: Vec<ScreenVerdict> = candidates
        .par_iter()
        .filter_map(|(path, listed)| match screen_one(path, listed, &codes, &config) {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                tracing::warn!(symbol = %listed.symbol, error = %e, "analysis failed, skipping");
                None
            }
        })
        .collect();

    let skipped = files.len() - verdicts.len();
    let (all, passing) = partition(verdicts);
    let screened = all.len();
    let passing_count = passing.len();
    tracing::info!(screened, passing = passing_count, skipped, "screen complete");

    let shown = if args.passing_only { passing } else { all };
    let results = if args.detailed {
        serde_json::to_value(&shown)?
    } else {
        serde_json::to_value(shown.iter().map(ScreenRow::from).collect::<Vec<_>>())?
    };

    Ok(serde_json::json!({
        "results": results,
        "screened": screened,
        "passing": passing_count,
        "skipped": skipped,
    }))
}

fn screen_one(
    path: &Path,
    listed: &ListedStock,
    codes: &CodeTable,
    config: &DopplerConfig,
) -> Result<ScreenVerdict, String> {
    let rows = input::file::read_csv_rows(path).map_err(|e| e.to_string())?;
    let stock = Stock::from_rows(&listed.symbol, &listed.name, listed.price, &rows, codes)
        .map_err(|e| e.to_string())?;
    let analysis = stock.analysis(&config.valuation).map_err(|e| e.to_string())?;
    Ok(screen(&analysis, &listed.secondary_figures(), &config.screen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CODES: &str = "\
Description,Code,Sign,General
Cash,CASH,1,liq
Debt,LTD,1,liab
Total assets,TA,1,asset
Net PPE,PPE,1,ppec
Operating cash flow,CFO,1,CF_P
Common shares,SHR,1,shares
Revenue,REV,1,rev
";

    const STATEMENT: &str = "\
Year,,2025,2024,2023,2022,2021,2020
Split,split,1,1,1,1,1,1
Units,un+,1,1,1,1,1,1
Cash,CASH,50,50,50,50,50,50
Debt,LTD,0,0,0,0,0,0
Total assets,TA,500,500,500,500,500,500
Net PPE,PPE,161.051,146.41,133.1,121,110,100
Operating cash flow,CFO,48.3153,43.923,39.93,36.3,33,30
Common shares,SHR,10,10,10,10,10,10
Revenue,REV,300,280,260,240,220,200
";

    const LISTING: &str = "\
Symbol,Name,LastSale,Sector,Industry,MarketCap,Assets,Revenue
ABC,ABC Corp,40,Industrials,Machinery,400,510,310
";

    fn args(dir: &Path, passing_only: bool) -> ScreenArgs {
        ScreenArgs {
            statements: dir.to_string_lossy().into_owned(),
            codes: None,
            listing: vec![dir.join("listing.txt").to_string_lossy().into_owned()],
            config: None,
            smoothing_window: None,
            window_policy: None,
            passing_only,
            detailed: false,
        }
    }

    #[test]
    fn test_screen_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("codes.csv"), CODES).unwrap();
        fs::write(dir.path().join("abc.csv"), STATEMENT).unwrap();
        fs::write(dir.path().join("zzz.csv"), STATEMENT).unwrap();
        fs::write(dir.path().join("listing.txt"), LISTING).unwrap();

        let out = run_screen(args(dir.path(), false)).unwrap();
        assert_eq!(out["screened"], 1);
        assert_eq!(out["skipped"], 1);
        assert_eq!(out["passing"], 1);
        assert_eq!(out["results"][0]["symbol"], "ABC");
        assert_eq!(out["results"][0]["passes"], true);
        assert_eq!(out["results"][0]["revenue_suspect"], false);
    }

    #[test]
    fn test_revenue_mismatch_fails_screen() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("codes.csv"), CODES).unwrap();
        fs::write(dir.path().join("abc.csv"), STATEMENT).unwrap();
        fs::write(
            dir.path().join("listing.txt"),
            LISTING.replace(",510,310", ",510,3000"),
        )
        .unwrap();

        let out = run_screen(args(dir.path(), false)).unwrap();
        assert_eq!(out["passing"], 0);
        assert_eq!(out["results"][0]["revenue_suspect"], true);
        assert_eq!(out["results"][0]["assets_suspect"], false);
    }
}
