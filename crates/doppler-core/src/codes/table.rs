use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DopplerError;
use crate::DopplerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// General category a specific line-item code rolls up into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Liquid assets
    Liq,
    /// Total assets
    Asset,
    /// Total equity
    Equity,
    /// Nonconvertible liabilities
    Liab,
    /// Convertible liabilities
    LiabC,
    /// Nonconvertible share count
    Shares,
    /// Convertible share count
    SharesC,
    /// Plant/property/equipment capital
    Ppec,
    /// Official cash flow from operations
    CfP,
    /// Income tax added back
    CfN2T,
    /// Costs reclassified to financing
    CfN2F,
    /// Income reclassified to financing
    CfP2F,
    /// Gains reclassified to investing
    CfP2I,
    /// Losses reclassified to investing
    CfN2I,
    /// Investing or financing items reclassified to operating
    Cf2O,
    /// Revenue, used only to cross-check against an outside source
    Rev,
    /// Code has no entry in the code table
    NotApplicable,
    /// Category present in the code table but not aggregated by the engine
    Other(String),
}

impl Category {
    pub fn as_code(&self) -> &str {
        match self {
            Category::Liq => "liq",
            Category::Asset => "asset",
            Category::Equity => "equity",
            Category::Liab => "liab",
            Category::LiabC => "liabc",
            Category::Shares => "shares",
            Category::SharesC => "sharesc",
            Category::Ppec => "ppec",
            Category::CfP => "CF_P",
            Category::CfN2T => "CF_N2T",
            Category::CfN2F => "CF_N2F",
            Category::CfP2F => "CF_P2F",
            Category::CfP2I => "CF_P2I",
            Category::CfN2I => "CF_N2I",
            Category::Cf2O => "CF_2O",
            Category::Rev => "rev",
            Category::NotApplicable => "N/A",
            Category::Other(code) => code,
        }
    }
}

impl From<String> for Category {
    fn from(code: String) -> Self {
        match code.trim() {
            "liq" => Category::Liq,
            "asset" => Category::Asset,
            "equity" => Category::Equity,
            "liab" => Category::Liab,
            "liabc" => Category::LiabC,
            "shares" => Category::Shares,
            "sharesc" => Category::SharesC,
            "ppec" => Category::Ppec,
            "CF_P" => Category::CfP,
            "CF_N2T" => Category::CfN2T,
            "CF_N2F" => Category::CfN2F,
            "CF_P2F" => Category::CfP2F,
            "CF_P2I" => Category::CfP2I,
            "CF_N2I" => Category::CfN2I,
            "CF_2O" => Category::Cf2O,
            "rev" => Category::Rev,
            "N/A" | "" => Category::NotApplicable,
            other => Category::Other(other.to_string()),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_code().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// Direction in which a line item contributes to its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Plus,
    Minus,
    Zero,
}

impl Sign {
    pub fn as_i8(self) -> i8 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1,
            Sign::Zero => 0,
        }
    }
}

impl FromStr for Sign {
    type Err = DopplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "+1" | "+" => Ok(Sign::Plus),
            "-1" | "-" => Ok(Sign::Minus),
            "0" => Ok(Sign::Zero),
            other => Err(DopplerError::InvalidInput {
                field: "sign".into(),
                reason: format!("'{other}' is not one of +1, -1, 0"),
            }),
        }
    }
}

/// One row of the code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub sign: Sign,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CodeEntry {
    /// The inert entry every unmatched code resolves to.
    pub fn not_applicable(code: &str) -> Self {
        Self {
            code: code.to_string(),
            sign: Sign::Zero,
            category: Category::NotApplicable,
            description: None,
        }
    }

    pub fn is_inert(&self) -> bool {
        self.sign == Sign::Zero || self.category == Category::NotApplicable
    }
}

/// Static mapping from specific line-item code to (general category, sign),
/// shared by every analyzed stock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeTable {
    entries: Vec<CodeEntry>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl CodeTable {
    /// Build a table from entries. When a code appears twice the first entry wins.
    pub fn new(entries: Vec<CodeEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            index.entry(entry.code.clone()).or_insert(i);
        }
        Self { entries, index }
    }

    /// Parse the code-table file layout: a header row followed by rows of
    /// `description, specific code, sign, general category`.
    pub fn from_rows(rows: &[Vec<String>]) -> DopplerResult<Self> {
        let mut entries = Vec::with_capacity(rows.len().saturating_sub(1));
        for (line, row) in rows.iter().enumerate().skip(1) {
            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            if row.len() < 4 {
                return Err(DopplerError::InvalidInput {
                    field: format!("code table row {}", line + 1),
                    reason: format!("expected 4 columns, found {}", row.len()),
                });
            }
            let sign = row[2].parse::<Sign>().map_err(|_| DopplerError::InvalidInput {
                field: format!("code table row {}", line + 1),
                reason: format!("sign '{}' is not one of +1, -1, 0", row[2].trim()),
            })?;
            let description = row[0].trim();
            entries.push(CodeEntry {
                code: row[1].trim().to_string(),
                sign,
                category: Category::from(row[3].clone()),
                description: (!description.is_empty()).then(|| description.to_string()),
            });
        }
        Ok(Self::new(entries))
    }

    /// Resolve a specific code; unmatched codes resolve to the inert `N/A` entry.
    pub fn lookup(&self, code: &str) -> CodeEntry {
        self.get(code)
            .cloned()
            .unwrap_or_else(|| CodeEntry::not_applicable(code))
    }

    pub fn get(&self, code: &str) -> Option<&CodeEntry> {
        let position = match self.index.get(code.trim()) {
            Some(i) => Some(*i),
            // deserialized tables carry no index
            None if self.index.is_empty() => self.entries.iter().position(|e| e.code == code.trim()),
            None => None,
        };
        position.and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
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
            row(&["Description", "Code", "Sign", "General"]),
            row(&["Cash and equivalents", "CASH", "1", "liq"]),
            row(&["Short-term investments", "STI", "1", "liq"]),
            row(&["Accumulated depreciation", "ADEP", "-1", "ppec"]),
            row(&["Income tax", "TAX", "1", "CF_N2T"]),
            row(&["Goodwill", "GW", "1", "intangible"]),
        ]
    }

    #[test]
    fn test_parse_code_table() {
        let table = CodeTable::from_rows(&sample_rows()).unwrap();
        assert_eq!(table.len(), 5);

        let cash = table.lookup("CASH");
        assert_eq!(cash.category, Category::Liq);
        assert_eq!(cash.sign, Sign::Plus);
        assert_eq!(cash.description.as_deref(), Some("Cash and equivalents"));

        let dep = table.lookup("ADEP");
        assert_eq!(dep.category, Category::Ppec);
        assert_eq!(dep.sign, Sign::Minus);

        assert_eq!(table.lookup("TAX").category, Category::CfN2T);
    }

    #[test]
    fn test_unknown_code_is_inert() {
        let table = CodeTable::from_rows(&sample_rows()).unwrap();
        let entry = table.lookup("XYZ123");
        assert_eq!(entry.category, Category::NotApplicable);
        assert_eq!(entry.sign, Sign::Zero);
        assert!(entry.is_inert());
    }

    #[test]
    fn test_unaggregated_category_is_kept() {
        let table = CodeTable::from_rows(&sample_rows()).unwrap();
        assert_eq!(
            table.lookup("GW").category,
            Category::Other("intangible".into())
        );
    }

    #[test]
    fn test_first_duplicate_wins() {
        let mut rows = sample_rows();
        rows.push(row(&["Cash again", "CASH", "-1", "liab"]));
        let table = CodeTable::from_rows(&rows).unwrap();
        assert_eq!(table.lookup("CASH").category, Category::Liq);
    }

    #[test]
    fn test_bad_sign_rejected() {
        let mut rows = sample_rows();
        rows.push(row(&["Broken", "BRK", "plus", "liq"]));
        assert!(CodeTable::from_rows(&rows).is_err());
    }

    #[test]
    fn test_short_row_rejected() {
        let mut rows = sample_rows();
        rows.push(row(&["Broken", "BRK"]));
        assert!(CodeTable::from_rows(&rows).is_err());
    }

    #[test]
    fn test_category_round_trips_through_code() {
        for code in ["liq", "liabc", "sharesc", "CF_P2I", "CF_2O", "rev", "N/A"] {
            assert_eq!(Category::from(code.to_string()).as_code(), code);
        }
    }
}
