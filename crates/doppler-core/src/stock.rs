use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::capital::{resolve, Aggregate, CapitalStructure};
use crate::codes::CodeTable;
use crate::config::ValuationConfig;
use crate::error::DopplerError;
use crate::statement::{normalize_rows, CategoryMembers, NormalizedStatement};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::valuation::{latest_ratios, value, LatestRatios, Valuation};
use crate::DopplerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One analyzed symbol: its normalized statement plus scalar metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    /// Market price; undefined when the listing has none
    pub price: Option<Money>,
    pub statement: NormalizedStatement,
}

/// Everything derived from one stock's statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAnalysis {
    pub symbol: String,
    pub name: String,
    pub price: Option<Money>,
    /// Year labels, oldest first
    pub years: Vec<String>,
    /// Codes with no code-table entry
    pub unknown_codes: Vec<String>,
    /// Contributors to each category/sign pair
    pub breakdown: Vec<CategoryMembers>,
    pub capital: CapitalStructure,
    pub valuation: Valuation,
    pub ratios: LatestRatios,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl Stock {
    pub fn new(symbol: &str, name: &str, price: Option<Money>, statement: NormalizedStatement) -> Self {
        Self {
            symbol: symbol.trim().to_string(),
            name: name.trim().to_string(),
            price,
            statement,
        }
    }

    /// Build a stock from raw statement rows and the shared code table.
    pub fn from_rows(
        symbol: &str,
        name: &str,
        price: Option<Money>,
        rows: &[Vec<String>],
        codes: &CodeTable,
    ) -> DopplerResult<Self> {
        let statement = normalize_rows(rows, codes)?;
        Ok(Self::new(symbol, name, price, statement))
    }

    /// Run the full pipeline and wrap the result in the output envelope.
    pub fn analyze(&self, config: &ValuationConfig) -> DopplerResult<ComputationOutput<StockAnalysis>> {
        let start = Instant::now();
        let analysis = self.analysis(config)?;
        let warnings = analysis_warnings(&analysis, config);

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Doppler valuation: return on PPE, smoothed projection, conservative convertible treatment",
            config,
            warnings,
            elapsed,
            analysis,
        ))
    }

    /// The pipeline without the envelope.
    pub fn analysis(&self, config: &ValuationConfig) -> DopplerResult<StockAnalysis> {
        config.validate()?;
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                return Err(DopplerError::InvalidInput {
                    field: "price".into(),
                    reason: "Market price cannot be negative".into(),
                });
            }
        }

        tracing::debug!(symbol = %self.symbol, years = self.statement.num_years(), "analyzing stock");

        let capital = resolve(&self.statement);
        let valuation = value(&capital, config);
        let ratios = latest_ratios(&valuation, self.price, config.capitalization_multiple);

        Ok(StockAnalysis {
            symbol: self.symbol.clone(),
            name: self.name.clone(),
            price: self.price,
            years: self.statement.years.clone(),
            unknown_codes: self.statement.unknown_codes(),
            breakdown: self.statement.breakdown(),
            capital,
            valuation,
            ratios,
        })
    }
}

impl StockAnalysis {
    pub fn latest_year(&self) -> Option<&str> {
        self.years.last().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn analysis_warnings(analysis: &StockAnalysis, config: &ValuationConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !analysis.unknown_codes.is_empty() {
        warnings.push(format!(
            "{} line-item code(s) not in the code table were ignored: {}",
            analysis.unknown_codes.len(),
            analysis.unknown_codes.join(", ")
        ));
    }
    if analysis.years.len() <= config.smoothing_window {
        warnings.push(format!(
            "Only {} year(s) of data for a {}-year smoothing window",
            analysis.years.len(),
            config.smoothing_window
        ));
    }
    if analysis.capital.aggregates.get(Aggregate::Shares).is_all_undefined() {
        warnings.push("No share count found; per-share figures are undefined".into());
    }
    if analysis.capital.aggregates.get(Aggregate::Ppe).is_all_undefined() {
        warnings.push("No PPE found; return on PPE is undefined".into());
    }
    if analysis.valuation.selected.intrinsic_value.latest().is_none() {
        warnings.push("Latest intrinsic value per share is undefined".into());
    }
    if analysis.price.is_none() {
        warnings.push("No market price; price ratios are undefined".into());
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn codes() -> CodeTable {
        CodeTable::from_rows(&[
            row(&["Description", "Code", "Sign", "General"]),
            row(&["Cash", "CASH", "1", "liq"]),
            row(&["Debt", "LTD", "1", "liab"]),
            row(&["Net PPE", "PPE", "1", "ppec"]),
            row(&["Operating cash flow", "CFO", "1", "CF_P"]),
            row(&["Common shares", "SHR", "1", "shares"]),
        ])
        .unwrap()
    }

    fn rows() -> Vec<Vec<String>> {
        vec![
            row(&["Year", "", "2023", "2022", "2021", "2020"]),
            row(&["Split", "split", "1", "1", "1", "1"]),
            row(&["Units", "un+", "1", "1", "1", "1"]),
            row(&["Cash", "CASH", "50", "50", "50", "50"]),
            row(&["Debt", "LTD", "0", "0", "0", "0"]),
            row(&["Net PPE", "PPE", "133.1", "121", "110", "100"]),
            row(&["Operating cash flow", "CFO", "39.93", "36.3", "33", "30"]),
            row(&["Common shares", "SHR", "10", "10", "10", "10"]),
            row(&["Mystery", "XYZ123", "1", "1", "1", "1"]),
        ]
    }

    #[test]
    fn test_analyze_envelope() {
        let stock = Stock::from_rows("abc", "ABC Corp", Some(dec!(40)), &rows(), &codes()).unwrap();
        let cfg = ValuationConfig {
            smoothing_window: 2,
            ..ValuationConfig::default()
        };
        let out = stock.analyze(&cfg).unwrap();
        let a = &out.result;
        assert_eq!(a.symbol, "abc");
        assert_eq!(a.latest_year(), Some("2023"));
        assert_eq!(a.unknown_codes, vec!["XYZ123"]);
        assert!(out.warnings.iter().any(|w| w.contains("XYZ123")));
        // 2023: 5 + 10 × 12.1 × 0.23
        assert_eq!(a.valuation.selected.intrinsic_value.latest(), Some(dec!(32.83)));
        // earnings = 13.31 × 0.23
        assert_eq!(a.ratios.earnings, Some(dec!(3.0613)));
        assert_eq!(a.ratios.price_adjusted, Some(dec!(35)));
    }

    #[test]
    fn test_negative_price_rejected() {
        let stock = Stock::from_rows("abc", "ABC", Some(dec!(-1)), &rows(), &codes()).unwrap();
        assert!(stock.analyze(&ValuationConfig::default()).is_err());
    }

    #[test]
    fn test_missing_price_only_blanks_price_ratios() {
        let stock = Stock::from_rows("abc", "ABC", None, &rows(), &codes()).unwrap();
        let cfg = ValuationConfig {
            smoothing_window: 2,
            ..ValuationConfig::default()
        };
        let a = stock.analysis(&cfg).unwrap();
        assert!(a.ratios.earnings.is_some());
        assert!(a.ratios.book_value.is_some());
        assert_eq!(a.ratios.price_to_book, None);
        assert_eq!(a.ratios.price_to_earnings, None);
    }
}
