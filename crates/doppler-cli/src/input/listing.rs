//! Exchange listing files.
//!
//! A listing supplies the price (and optionally independently sourced
//! total-assets and revenue figures) of every symbol. Funds, recognisable by an `n/a`
//! sector and industry, are dropped.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use doppler_core::screening::SecondaryFigures;
use doppler_core::statement::parse_number;
use doppler_core::Money;

/// One listed company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedStock {
    pub symbol: String,
    pub name: String,
    pub price: Option<Money>,
    pub sector: String,
    pub industry: String,
    pub market_cap: Option<Money>,
    /// Total assets from the listing source, for the cross-check
    pub assets: Option<Money>,
    /// Latest revenue from the listing source, for the cross-check
    pub revenue: Option<Money>,
}

impl ListedStock {
    pub fn secondary_figures(&self) -> SecondaryFigures {
        SecondaryFigures {
            assets: self.assets,
            revenue: self.revenue,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingRecord {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "LastSale", default)]
    last_sale: String,
    #[serde(rename = "Sector", default)]
    sector: String,
    #[serde(rename = "Industry", default)]
    industry: String,
    #[serde(rename = "MarketCap", default)]
    market_cap: String,
    #[serde(rename = "Assets", default)]
    assets: String,
    #[serde(rename = "Revenue", default)]
    revenue: String,
}

/// Listings keyed by normalized symbol.
pub type Listing = BTreeMap<String, ListedStock>;

/// Read and merge listing files; a symbol listed twice keeps its first entry.
pub fn read_listings(paths: &[String]) -> Result<Listing, Box<dyn std::error::Error>> {
    let mut listing = Listing::new();
    for path in paths {
        for stock in read_listing(Path::new(path))? {
            if listing.contains_key(&stock.symbol) {
                tracing::warn!(symbol = %stock.symbol, file = %path, "symbol listed twice, keeping first");
                continue;
            }
            listing.insert(stock.symbol.clone(), stock);
        }
    }
    Ok(listing)
}

pub fn read_listing(path: &Path) -> Result<Vec<ListedStock>, Box<dyn std::error::Error>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;

    let mut stocks = Vec::new();
    for record in reader.deserialize() {
        let record: ListingRecord =
            record.map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
        if is_fund(&record) {
            continue;
        }
        stocks.push(ListedStock {
            symbol: normalize_symbol(&record.symbol),
            name: record.name.replace("&#39;", "'"),
            price: parse_money(&record.last_sale),
            sector: record.sector,
            industry: record.industry,
            market_cap: parse_money(&record.market_cap),
            assets: parse_money(&record.assets),
            revenue: parse_money(&record.revenue),
        });
    }
    tracing::info!(file = %path.display(), stocks = stocks.len(), "read listing");
    Ok(stocks)
}

/// Remove spaces and write share-class separators as dots: `BRK/B` → `BRK.B`.
pub fn normalize_symbol(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| if ch == '/' { '.' } else { ch })
        .collect::<String>()
        .to_uppercase()
}

fn is_fund(record: &ListingRecord) -> bool {
    record.sector.eq_ignore_ascii_case("n/a") && record.industry.eq_ignore_ascii_case("n/a")
}

fn parse_money(raw: &str) -> Option<Decimal> {
    parse_number(raw.trim_start_matches('$'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const LISTING: &str = "\
\"Symbol\",\"Name\",\"LastSale\",\"MarketCap\",\"Sector\",\"Industry\",
\"BRK/B\",\"Berkshire\",\"412.5\",\"900000000000\",\"Finance\",\"Insurance\",
\"QQQ\",\"Invesco QQQ\",\"440.1\",\"n/a\",\"n/a\",\"n/a\",
\"MCD\",\"McDonald&#39;s Corporation\",\"n/a\",\"200000000000\",\"Consumer Services\",\"Restaurants\",
";

    fn listing() -> Vec<ListedStock> {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(LISTING.as_bytes()).unwrap();
        read_listing(file.path()).unwrap()
    }

    #[test]
    fn test_funds_skipped() {
        let stocks = listing();
        let symbols: Vec<&str> = stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BRK.B", "MCD"]);
    }

    #[test]
    fn test_name_and_price_cleanup() {
        let stocks = listing();
        assert_eq!(stocks[0].price, Some(dec!(412.5)));
        assert_eq!(stocks[1].name, "McDonald's Corporation");
        assert_eq!(stocks[1].price, None);
        assert_eq!(stocks[1].assets, None);
        assert_eq!(stocks[1].revenue, None);
    }

    #[test]
    fn test_optional_cross_check_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"Symbol,Name,LastSale,Sector,Industry,Assets,Revenue\n\
              ABC,ABC Corp,$40,Industrials,Machinery,510,$1250.5\n",
        )
        .unwrap();
        let stocks = read_listing(file.path()).unwrap();
        assert_eq!(
            stocks[0].secondary_figures(),
            SecondaryFigures {
                assets: Some(dec!(510)),
                revenue: Some(dec!(1250.5)),
            }
        );
    }

    #[test]
    fn test_symbol_normalization() {
        assert_eq!(normalize_symbol(" ab c/d "), "ABC.D");
    }
}
