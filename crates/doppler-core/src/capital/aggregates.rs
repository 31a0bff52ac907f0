use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::codes::{Category, Sign};
use crate::series::YearSeries;
use crate::statement::NormalizedStatement;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-year aggregate derived from one general category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Liquid,
    TotalAssets,
    TotalEquity,
    Liabilities,
    ConvertibleLiabilities,
    Shares,
    ConvertibleShares,
    Ppe,
    OperatingCashFlow,
    IncomeTax,
    CostsToFinancing,
    IncomeToFinancing,
    GainsToInvesting,
    LossesToInvesting,
    ReclassifiedToOperating,
    Revenue,
}

/// How nominal category totals become an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scaling {
    /// `unit_plus × plus − unit_minus × minus`
    Dollars,
    /// Nominal count; units never apply to share counts.
    Count,
}

/// Value of an aggregate whose category has no line items at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    Undefined,
    Zero,
}

/// One row of the aggregate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRule {
    pub aggregate: Aggregate,
    pub category: Category,
    pub scaling: Scaling,
    pub when_absent: AbsentPolicy,
    /// Whether minus-signed rows are netted against plus-signed rows.
    pub nets_minus: bool,
}

impl Aggregate {
    pub const ALL: [Aggregate; 16] = [
        Aggregate::Liquid,
        Aggregate::TotalAssets,
        Aggregate::TotalEquity,
        Aggregate::Liabilities,
        Aggregate::ConvertibleLiabilities,
        Aggregate::Shares,
        Aggregate::ConvertibleShares,
        Aggregate::Ppe,
        Aggregate::OperatingCashFlow,
        Aggregate::IncomeTax,
        Aggregate::CostsToFinancing,
        Aggregate::IncomeToFinancing,
        Aggregate::GainsToInvesting,
        Aggregate::LossesToInvesting,
        Aggregate::ReclassifiedToOperating,
        Aggregate::Revenue,
    ];

    /// The aggregate table: source category, scaling and absent-category policy.
    ///
    /// Convertibles and the optional cash-flow reclassifications are zero when
    /// the statement never mentions them; everything else is undefined.
    /// Share counts and convertible liabilities total their plus-signed rows
    /// only.
    pub fn rule(self) -> AggregateRule {
        use AbsentPolicy::{Undefined, Zero};
        use Scaling::{Count, Dollars};

        let (category, scaling, when_absent) = match self {
            Aggregate::Liquid => (Category::Liq, Dollars, Undefined),
            Aggregate::TotalAssets => (Category::Asset, Dollars, Undefined),
            Aggregate::TotalEquity => (Category::Equity, Dollars, Undefined),
            Aggregate::Liabilities => (Category::Liab, Dollars, Undefined),
            Aggregate::ConvertibleLiabilities => (Category::LiabC, Dollars, Zero),
            Aggregate::Shares => (Category::Shares, Count, Undefined),
            Aggregate::ConvertibleShares => (Category::SharesC, Count, Zero),
            Aggregate::Ppe => (Category::Ppec, Dollars, Undefined),
            Aggregate::OperatingCashFlow => (Category::CfP, Dollars, Undefined),
            Aggregate::IncomeTax => (Category::CfN2T, Dollars, Zero),
            Aggregate::CostsToFinancing => (Category::CfN2F, Dollars, Zero),
            Aggregate::IncomeToFinancing => (Category::CfP2F, Dollars, Zero),
            Aggregate::GainsToInvesting => (Category::CfP2I, Dollars, Zero),
            Aggregate::LossesToInvesting => (Category::CfN2I, Dollars, Zero),
            Aggregate::ReclassifiedToOperating => (Category::Cf2O, Dollars, Zero),
            Aggregate::Revenue => (Category::Rev, Dollars, Undefined),
        };
        let nets_minus = !matches!(
            self,
            Aggregate::ConvertibleLiabilities | Aggregate::Shares | Aggregate::ConvertibleShares
        );
        AggregateRule {
            aggregate: self,
            category,
            scaling,
            when_absent,
            nets_minus,
        }
    }
}

/// Every aggregate of one statement, on the statement's year axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAggregates {
    pub num_years: usize,
    pub values: BTreeMap<Aggregate, YearSeries>,
}

impl ResolvedAggregates {
    pub fn get(&self, aggregate: Aggregate) -> YearSeries {
        self.values
            .get(&aggregate)
            .cloned()
            .unwrap_or_else(|| YearSeries::undefined(self.num_years))
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve every aggregate in [`Aggregate::ALL`].
pub fn resolve_aggregates(stmt: &NormalizedStatement) -> ResolvedAggregates {
    let values = Aggregate::ALL
        .iter()
        .map(|aggregate| (*aggregate, derive(stmt, &aggregate.rule())))
        .collect();
    ResolvedAggregates {
        num_years: stmt.num_years(),
        values,
    }
}

/// Derive one aggregate from the statement's category totals.
pub fn derive(stmt: &NormalizedStatement, rule: &AggregateRule) -> YearSeries {
    let n = stmt.num_years();
    if !stmt.has_category(&rule.category) {
        return match rule.when_absent {
            AbsentPolicy::Undefined => YearSeries::undefined(n),
            AbsentPolicy::Zero => YearSeries::zeros(n),
        };
    }

    let plus = stmt
        .category_total(&rule.category, Sign::Plus)
        .unwrap_or_else(|| YearSeries::undefined(n));
    let minus = stmt
        .category_total(&rule.category, Sign::Minus)
        .filter(|_| rule.nets_minus);

    let (unit_plus, unit_minus) = match rule.scaling {
        Scaling::Dollars => (stmt.unit_plus.clone(), stmt.unit_minus.clone()),
        Scaling::Count => (YearSeries::filled(n, Decimal::ONE), YearSeries::filled(n, Decimal::ONE)),
    };
    let plus_term = unit_plus.times(&plus);
    match minus {
        Some(minus) => plus_term.minus_or_keep(&unit_minus.times(&minus)),
        None => plus_term,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::CodeTable;
    use crate::statement::normalize_rows;
    use rust_decimal_macros::dec;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn codes() -> CodeTable {
        CodeTable::from_rows(&[
            row(&["Description", "Code", "Sign", "General"]),
            row(&["Cash", "CASH", "1", "liq"]),
            row(&["Overdraft", "OVD", "-1", "liq"]),
            row(&["Gross PPE", "PPEG", "1", "ppec"]),
            row(&["Depreciation", "DEP", "-1", "ppec"]),
            row(&["Common shares", "SHR", "1", "shares"]),
            row(&["Convertible notes", "CNV", "1", "liabc"]),
            row(&["Note discount", "CND", "-1", "liabc"]),
            row(&["Treasury shares", "TSY", "-1", "shares"]),
            row(&["Revenue", "REV", "1", "rev"]),
        ])
        .unwrap()
    }

    fn stmt(rows: Vec<Vec<String>>) -> NormalizedStatement {
        normalize_rows(&rows, &codes()).unwrap()
    }

    fn header(minus_unit: Option<&[&str]>) -> Vec<Vec<String>> {
        let mut rows = vec![
            row(&["Year", "", "2023", "2022"]),
            row(&["Split", "split", "1", "1"]),
            row(&["Units", "un+", "1000", "1000"]),
        ];
        if let Some(units) = minus_unit {
            let mut r = row(&["Units", "un-"]);
            r.extend(units.iter().map(|u| u.to_string()));
            rows.push(r);
        }
        rows
    }

    #[test]
    fn test_dollars_apply_both_units() {
        let mut rows = header(Some(&["1", "1"]));
        rows.push(row(&["Cash", "CASH", "10", "8"]));
        rows.push(row(&["Overdraft", "OVD", "500", "400"]));
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(
            agg.get(Aggregate::Liquid),
            YearSeries::new(vec![Some(dec!(7600)), Some(dec!(9500))])
        );
    }

    #[test]
    fn test_undefined_minus_term_falls_back_to_plus() {
        let mut rows = header(None);
        rows.push(row(&["Gross PPE", "PPEG", "100", "90"]));
        rows.push(row(&["Depreciation", "DEP", "", "10"]));
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(
            agg.get(Aggregate::Ppe),
            YearSeries::new(vec![Some(dec!(80000)), Some(dec!(100000))])
        );
    }

    #[test]
    fn test_undefined_plus_term_is_undefined() {
        let mut rows = header(None);
        rows.push(row(&["Gross PPE", "PPEG", "", "90"]));
        rows.push(row(&["Depreciation", "DEP", "5", "10"]));
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(
            agg.get(Aggregate::Ppe),
            YearSeries::new(vec![Some(dec!(80000)), None])
        );
    }

    #[test]
    fn test_share_counts_ignore_units() {
        let mut rows = header(None);
        rows.push(row(&["Common shares", "SHR", "50", "50"]));
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(agg.get(Aggregate::Shares), YearSeries::filled(2, dec!(50)));
    }

    #[test]
    fn test_minus_rows_skipped_for_shares_and_convertible_debt() {
        let mut rows = header(None);
        rows.push(row(&["Common shares", "SHR", "50", "50"]));
        rows.push(row(&["Treasury shares", "TSY", "5", "4"]));
        rows.push(row(&["Convertible notes", "CNV", "2", "1"]));
        rows.push(row(&["Note discount", "CND", "1", "1"]));
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(agg.get(Aggregate::Shares), YearSeries::filled(2, dec!(50)));
        assert_eq!(
            agg.get(Aggregate::ConvertibleLiabilities),
            YearSeries::new(vec![Some(dec!(1000)), Some(dec!(2000))])
        );
        assert!(!Aggregate::Shares.rule().nets_minus);
        assert!(Aggregate::Ppe.rule().nets_minus);
    }

    #[test]
    fn test_revenue_scaled_by_dollar_units() {
        let mut rows = header(None);
        rows.push(row(&["Revenue", "REV", "7", "6"]));
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(
            agg.get(Aggregate::Revenue),
            YearSeries::new(vec![Some(dec!(6000)), Some(dec!(7000))])
        );
        assert_eq!(
            resolve_aggregates(&stmt(header(None))).get(Aggregate::Revenue),
            YearSeries::undefined(2)
        );
    }

    #[test]
    fn test_absent_policies() {
        let rows = header(None);
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(agg.get(Aggregate::ConvertibleLiabilities), YearSeries::zeros(2));
        assert_eq!(agg.get(Aggregate::ConvertibleShares), YearSeries::zeros(2));
        assert_eq!(agg.get(Aggregate::IncomeTax), YearSeries::zeros(2));
        assert_eq!(agg.get(Aggregate::Liquid), YearSeries::undefined(2));
        assert_eq!(agg.get(Aggregate::OperatingCashFlow), YearSeries::undefined(2));
    }

    #[test]
    fn test_present_convertibles_are_scaled() {
        let mut rows = header(None);
        rows.push(row(&["Convertible notes", "CNV", "2", "1"]));
        let agg = resolve_aggregates(&stmt(rows));
        assert_eq!(
            agg.get(Aggregate::ConvertibleLiabilities),
            YearSeries::new(vec![Some(dec!(1000)), Some(dec!(2000))])
        );
    }

    #[test]
    fn test_every_aggregate_resolved() {
        let agg = resolve_aggregates(&stmt(header(None)));
        assert_eq!(agg.values.len(), Aggregate::ALL.len());
    }
}
