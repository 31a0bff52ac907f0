use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DopplerError;
use crate::series::YearSeries;
use crate::types::Cell;
use crate::DopplerResult;

/// Code marking row 3 of a statement as the minus-unit row.
pub const UNIT_MINUS_CODE: &str = "un-";

/// Rows 0..3 are years, split factors and plus units.
const FIXED_HEADER_ROWS: usize = 3;

/// Columns 0 and 1 hold the title and the specific code.
const LEADING_COLUMNS: usize = 2;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One statement line item with its raw values, oldest year first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub title: String,
    pub code: String,
    pub values: YearSeries,
}

/// A per-stock statement table, re-ordered oldest year first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    /// Year labels, oldest first
    pub years: Vec<String>,
    /// Cumulative share-split multiplier per year
    pub split_factors: YearSeries,
    /// Multiplier for plus-signed figures (1e3 for "thousands", ...)
    pub unit_plus: YearSeries,
    /// Multiplier for minus-signed figures
    pub unit_minus: YearSeries,
    /// True when the source carried an explicit `un-` row
    pub explicit_minus_unit: bool,
    pub line_items: Vec<LineItem>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl StatementTable {
    /// Assemble a table from already-parsed parts, oldest year first.
    ///
    /// Every series must have one value per year; a missing `unit_minus`
    /// defaults to `unit_plus`.
    pub fn new(
        years: Vec<String>,
        split_factors: YearSeries,
        unit_plus: YearSeries,
        unit_minus: Option<YearSeries>,
        line_items: Vec<LineItem>,
    ) -> DopplerResult<Self> {
        if years.is_empty() {
            return Err(DopplerError::MalformedStatement(
                "statement has no year columns".into(),
            ));
        }
        let n = years.len();
        check_len("split factors", n, split_factors.len())?;
        check_len("plus units", n, unit_plus.len())?;
        if let Some(ref minus) = unit_minus {
            check_len("minus units", n, minus.len())?;
        }
        for item in &line_items {
            check_len(&format!("line item '{}'", item.title), n, item.values.len())?;
        }

        let explicit_minus_unit = unit_minus.is_some();
        let unit_minus = unit_minus.unwrap_or_else(|| unit_plus.clone());
        Ok(Self {
            years,
            split_factors,
            unit_plus,
            unit_minus,
            explicit_minus_unit,
            line_items,
        })
    }

    /// Parse the raw statement layout, whose year columns run newest first.
    ///
    /// Row 0 holds year labels, row 1 split factors, row 2 the plus unit and,
    /// when its code column is `un-`, row 3 the minus unit. Remaining rows are
    /// line items `(title, code, values...)`. Short rows are padded with
    /// missing values; rows longer than the year axis are rejected.
    ///
    /// Without a `un-` row the minus unit is the plus unit, not zero, so
    /// minus-signed rows still subtract at the statement's own scale.
    pub fn from_rows(rows: &[Vec<String>]) -> DopplerResult<Self> {
        if rows.len() < FIXED_HEADER_ROWS {
            return Err(DopplerError::MalformedStatement(format!(
                "expected at least {FIXED_HEADER_ROWS} header rows, found {}",
                rows.len()
            )));
        }

        let year_row = rows[0].get(LEADING_COLUMNS..).unwrap_or_default();
        let n_years = year_row
            .iter()
            .rposition(|cell| !cell.trim().is_empty())
            .map_or(0, |last| last + 1);
        if n_years == 0 {
            return Err(DopplerError::MalformedStatement(
                "statement has no year columns".into(),
            ));
        }
        let years: Vec<String> = year_row[..n_years]
            .iter()
            .rev()
            .map(|y| y.trim().to_string())
            .collect();

        let split_factors = parse_row(&rows[1], n_years, "split factors", parse_number)?;
        let unit_plus = parse_row(&rows[2], n_years, "plus units", parse_unit)?;

        let has_minus_row = rows
            .get(FIXED_HEADER_ROWS)
            .and_then(|row| row.get(1))
            .is_some_and(|code| code.trim() == UNIT_MINUS_CODE);
        let unit_minus = if has_minus_row {
            Some(parse_row(
                &rows[FIXED_HEADER_ROWS],
                n_years,
                "minus units",
                parse_unit,
            )?)
        } else {
            None
        };

        let first_item = FIXED_HEADER_ROWS + usize::from(has_minus_row);
        let mut line_items = Vec::with_capacity(rows.len().saturating_sub(first_item));
        for row in &rows[first_item.min(rows.len())..] {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let title = row.first().map(|t| t.trim().to_string()).unwrap_or_default();
            let code = row.get(1).map(|c| c.trim().to_string()).unwrap_or_default();
            let values = parse_row(row, n_years, &format!("line item '{title}'"), parse_number)?;
            line_items.push(LineItem {
                title,
                code,
                values,
            });
        }

        tracing::debug!(
            years = n_years,
            line_items = line_items.len(),
            explicit_minus_unit = has_minus_row,
            "parsed statement table"
        );

        Self::new(years, split_factors, unit_plus, unit_minus, line_items)
    }

    pub fn num_years(&self) -> usize {
        self.years.len()
    }

    pub fn latest_year(&self) -> Option<&str> {
        self.years.last().map(String::as_str)
    }
}

/// Parse a raw figure: thousands separators and surrounding whitespace are
/// stripped; anything unparseable is missing, never zero.
pub fn parse_number(raw: &str) -> Cell {
    let cleaned: String = raw
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Parse a unit cell: either a number or a word label such as
/// "Figures in thousands of U.S. Dollars".
pub fn parse_unit(raw: &str) -> Cell {
    if let Some(value) = parse_number(raw) {
        return Some(value);
    }
    let label = raw.trim().to_ascii_lowercase();
    if label.contains("thousand") {
        Some(dec!(1000))
    } else if label.contains("million") {
        Some(dec!(1000000))
    } else if label.contains("billion") {
        Some(dec!(1000000000))
    } else if matches!(label.as_str(), "ones" | "units" | "dollars") {
        Some(Decimal::ONE)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn check_len(context: &str, expected: usize, actual: usize) -> DopplerResult<()> {
    if expected != actual {
        return Err(DopplerError::StructuralMismatch {
            context: context.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Take the value columns of a newest-first row and return them oldest first.
fn parse_row(
    row: &[String],
    n_years: usize,
    context: &str,
    parse: fn(&str) -> Cell,
) -> DopplerResult<YearSeries> {
    let cells = row.get(LEADING_COLUMNS..).unwrap_or_default();
    let used = cells
        .iter()
        .rposition(|cell| !cell.trim().is_empty())
        .map_or(0, |last| last + 1);
    if used > n_years {
        return Err(DopplerError::StructuralMismatch {
            context: context.to_string(),
            expected: n_years,
            actual: used,
        });
    }
    if cells.len() < n_years {
        tracing::warn!(
            row = context,
            found = cells.len(),
            expected = n_years,
            "short statement row padded with missing values"
        );
    }

    let newest_first: Vec<Cell> = (0..n_years)
        .map(|i| cells.get(i).and_then(|cell| parse(cell)))
        .collect();
    Ok(newest_first.into_iter().rev().collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sample_rows() -> Vec<Vec<String>> {
        vec![
            row(&["Year", "", "2023", "2022", "2021"]),
            row(&["Split factor", "split", "1", "1", "2"]),
            row(&["Units", "un+", "1000", "1000", "Figures in millions"]),
            row(&["Cash", "CASH", "1,500", "1,200", "900"]),
            row(&["PPE", "PPE", "10,000", "", "n/a"]),
        ]
    }

    #[test]
    fn test_years_reversed_oldest_first() {
        let table = StatementTable::from_rows(&sample_rows()).unwrap();
        assert_eq!(table.years, vec!["2021", "2022", "2023"]);
        assert_eq!(table.latest_year(), Some("2023"));
        assert_eq!(table.num_years(), 3);
    }

    #[test]
    fn test_values_reversed_and_parsed() {
        let table = StatementTable::from_rows(&sample_rows()).unwrap();
        let cash = &table.line_items[0];
        assert_eq!(cash.code, "CASH");
        assert_eq!(
            cash.values,
            YearSeries::new(vec![Some(dec!(900)), Some(dec!(1200)), Some(dec!(1500))])
        );
    }

    #[test]
    fn test_unparseable_values_are_missing() {
        let table = StatementTable::from_rows(&sample_rows()).unwrap();
        let ppe = &table.line_items[1];
        assert_eq!(
            ppe.values,
            YearSeries::new(vec![None, None, Some(dec!(10000))])
        );
    }

    #[test]
    fn test_unit_labels() {
        let table = StatementTable::from_rows(&sample_rows()).unwrap();
        assert_eq!(
            table.unit_plus,
            YearSeries::new(vec![Some(dec!(1000000)), Some(dec!(1000)), Some(dec!(1000))])
        );
        assert_eq!(table.split_factors.get(0), Some(dec!(2)));
    }

    #[test]
    fn test_minus_unit_defaults_to_plus_unit() {
        let table = StatementTable::from_rows(&sample_rows()).unwrap();
        assert!(!table.explicit_minus_unit);
        assert_eq!(table.unit_minus, table.unit_plus);
        assert_ne!(table.unit_minus, YearSeries::zeros(3));
    }

    #[test]
    fn test_explicit_minus_unit_row() {
        let mut rows = sample_rows();
        rows.insert(3, row(&["Units (minus)", "un-", "1", "1", "1"]));
        let table = StatementTable::from_rows(&rows).unwrap();
        assert!(table.explicit_minus_unit);
        assert_eq!(table.unit_minus, YearSeries::filled(3, Decimal::ONE));
        // the un- row is header, not a line item
        assert_eq!(table.line_items.len(), 2);
    }

    #[test]
    fn test_short_row_padded() {
        let mut rows = sample_rows();
        rows.push(row(&["Tax", "TAX", "50"]));
        let table = StatementTable::from_rows(&rows).unwrap();
        assert_eq!(
            table.line_items[2].values,
            YearSeries::new(vec![None, None, Some(dec!(50))])
        );
    }

    #[test]
    fn test_long_row_is_structural_mismatch() {
        let mut rows = sample_rows();
        rows.push(row(&["Tax", "TAX", "1", "2", "3", "4"]));
        let err = StatementTable::from_rows(&rows).unwrap_err();
        assert!(matches!(err, DopplerError::StructuralMismatch { .. }));
    }

    #[test]
    fn test_missing_header_rejected() {
        let rows = vec![row(&["Year", "", "2023"])];
        assert!(StatementTable::from_rows(&rows).is_err());
    }

    #[test]
    fn test_no_years_rejected() {
        let rows = vec![row(&["Year", ""]), row(&["s", "s"]), row(&["u", "u"])];
        assert!(matches!(
            StatementTable::from_rows(&rows),
            Err(DopplerError::MalformedStatement(_))
        ));
    }

    #[test]
    fn test_new_checks_lengths() {
        let result = StatementTable::new(
            vec!["2022".into(), "2023".into()],
            YearSeries::filled(2, Decimal::ONE),
            YearSeries::filled(3, Decimal::ONE),
            None,
            vec![],
        );
        assert!(matches!(
            result,
            Err(DopplerError::StructuralMismatch { expected: 2, actual: 3, .. })
        ));
    }

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number(" 1,234.5 "), Some(dec!(1234.5)));
        assert_eq!(parse_number("-7"), Some(dec!(-7)));
        assert_eq!(parse_number("2.5e3"), Some(dec!(2500)));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("--"), None);
    }

    #[test]
    fn test_parse_unit_labels() {
        assert_eq!(parse_unit("All numbers in thousands"), Some(dec!(1000)));
        assert_eq!(parse_unit("Billions"), Some(dec!(1000000000)));
        assert_eq!(parse_unit("1E6"), Some(dec!(1000000)));
        assert_eq!(parse_unit("ones"), Some(Decimal::ONE));
        assert_eq!(parse_unit("furlongs"), None);
    }
}
