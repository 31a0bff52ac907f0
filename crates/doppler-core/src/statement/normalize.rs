use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::codes::{Category, CodeTable, Sign};
use crate::series::YearSeries;
use crate::statement::table::StatementTable;
use crate::DopplerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A line item tagged with its general category and sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedItem {
    pub title: String,
    pub code: String,
    pub category: Category,
    pub sign: Sign,
    pub values: YearSeries,
}

/// The contributors to one (category, sign) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMembers {
    pub category: Category,
    pub sign: Sign,
    pub titles: Vec<String>,
    pub codes: Vec<String>,
}

/// A statement whose line items are categorized, oldest year first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedStatement {
    pub years: Vec<String>,
    pub split_factors: YearSeries,
    pub unit_plus: YearSeries,
    pub unit_minus: YearSeries,
    pub items: Vec<CategorizedItem>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Tag every line item with its code-table entry. Unknown codes become inert
/// `N/A` items; they are kept for reporting but never aggregated.
pub fn normalize(table: &StatementTable, codes: &CodeTable) -> NormalizedStatement {
    let items: Vec<CategorizedItem> = table
        .line_items
        .iter()
        .map(|item| {
            let entry = codes.lookup(&item.code);
            if entry.category == Category::NotApplicable {
                tracing::warn!(code = %item.code, title = %item.title, "line item code not in code table");
            }
            CategorizedItem {
                title: item.title.clone(),
                code: item.code.clone(),
                category: entry.category,
                sign: entry.sign,
                values: item.values.clone(),
            }
        })
        .collect();

    NormalizedStatement {
        years: table.years.clone(),
        split_factors: table.split_factors.clone(),
        unit_plus: table.unit_plus.clone(),
        unit_minus: table.unit_minus.clone(),
        items,
    }
}

/// Parse raw rows and normalize them in one step.
pub fn normalize_rows(rows: &[Vec<String>], codes: &CodeTable) -> DopplerResult<NormalizedStatement> {
    let table = StatementTable::from_rows(rows)?;
    Ok(normalize(&table, codes))
}

impl NormalizedStatement {
    pub fn num_years(&self) -> usize {
        self.years.len()
    }

    /// Line items in a given category with a given sign.
    pub fn members(&self, category: &Category, sign: Sign) -> impl Iterator<Item = &CategorizedItem> {
        let category = category.clone();
        self.items
            .iter()
            .filter(move |item| item.category == category && item.sign == sign)
    }

    /// True when at least one line item of either sign maps to `category`.
    pub fn has_category(&self, category: &Category) -> bool {
        self.items
            .iter()
            .any(|item| &item.category == category && item.sign != Sign::Zero)
    }

    /// Nominal (unit-less) total of a category/sign pair.
    ///
    /// `None` when no line item belongs to the pair. A year with any missing
    /// member value is undefined.
    pub fn category_total(&self, category: &Category, sign: Sign) -> Option<YearSeries> {
        let n = self.num_years();
        self.members(category, sign)
            .fold(None, |acc: Option<YearSeries>, item| {
                Some(acc.unwrap_or_else(|| YearSeries::zeros(n)).plus(&item.values))
            })
    }

    /// Specific codes that had no code-table entry, in statement order.
    pub fn unknown_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for item in &self.items {
            if item.category == Category::NotApplicable && !codes.contains(&item.code) {
                codes.push(item.code.clone());
            }
        }
        codes
    }

    /// Titles and codes of the contributors to every populated category/sign pair.
    pub fn breakdown(&self) -> Vec<CategoryMembers> {
        let mut groups: BTreeMap<(Category, Sign), CategoryMembers> = BTreeMap::new();
        for item in &self.items {
            if item.category == Category::NotApplicable || item.sign == Sign::Zero {
                continue;
            }
            let group = groups
                .entry((item.category.clone(), item.sign))
                .or_insert_with(|| CategoryMembers {
                    category: item.category.clone(),
                    sign: item.sign,
                    titles: Vec::new(),
                    codes: Vec::new(),
                });
            group.titles.push(item.title.clone());
            group.codes.push(item.code.clone());
        }
        groups.into_values().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
