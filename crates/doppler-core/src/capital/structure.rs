use serde::{Deserialize, Serialize};

use crate::capital::aggregates::{resolve_aggregates, Aggregate, ResolvedAggregates};
use crate::series::YearSeries;
use crate::statement::NormalizedStatement;
use crate::types::Cell;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Accounting treatment of convertible instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assumption {
    /// Convertibles remain debt
    AsDebt,
    /// Convertibles are converted into shares
    AsShares,
}

/// The same quantity computed under both convertible treatments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualAssumption<T> {
    pub as_debt: T,
    pub as_shares: T,
}

impl<T> DualAssumption<T> {
    pub fn from_fn(mut f: impl FnMut(Assumption) -> T) -> Self {
        Self {
            as_debt: f(Assumption::AsDebt),
            as_shares: f(Assumption::AsShares),
        }
    }

    pub fn get(&self, assumption: Assumption) -> &T {
        match assumption {
            Assumption::AsDebt => &self.as_debt,
            Assumption::AsShares => &self.as_shares,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Assumption, &T) -> U) -> DualAssumption<U> {
        DualAssumption::from_fn(|a| f(a, self.get(a)))
    }
}

impl DualAssumption<YearSeries> {
    /// Realized series: for each year, the value under that year's selected
    /// assumption, or undefined where no assumption was selected.
    pub fn select(&self, selector: &[Option<Assumption>]) -> YearSeries {
        assert_eq!(
            selector.len(),
            self.as_debt.len(),
            "year series must share one year axis"
        );
        selector
            .iter()
            .enumerate()
            .map(|(c, choice)| choice.and_then(|a| self.get(a).get(c)))
            .collect()
    }
}

/// Dollar aggregates plus the share counts and net liquidity derived from
/// them under both convertible treatments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalStructure {
    pub aggregates: ResolvedAggregates,
    pub split_factors: YearSeries,
    /// Split-adjusted shares outstanding
    pub shares_adjusted: DualAssumption<YearSeries>,
    /// Net liquid assets in dollars
    pub net_liquidity: DualAssumption<YearSeries>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Resolve the capital structure of a normalized statement.
pub fn resolve(stmt: &NormalizedStatement) -> CapitalStructure {
    let aggregates = resolve_aggregates(stmt);

    let shares = aggregates.get(Aggregate::Shares);
    let convertible_shares = aggregates.get(Aggregate::ConvertibleShares);
    let shares_adjusted = DualAssumption {
        as_debt: shares.times(&stmt.split_factors),
        as_shares: shares.plus(&convertible_shares).times(&stmt.split_factors),
    };

    let as_shares = net_liquidity_before_convertibles(&aggregates);
    let as_debt = as_shares.minus_or_keep(&aggregates.get(Aggregate::ConvertibleLiabilities));

    tracing::debug!(years = stmt.num_years(), "resolved capital structure");

    CapitalStructure {
        aggregates,
        split_factors: stmt.split_factors.clone(),
        shares_adjusted,
        net_liquidity: DualAssumption { as_debt, as_shares },
    }
}

impl CapitalStructure {
    pub fn num_years(&self) -> usize {
        self.split_factors.len()
    }

    /// Dollar aggregate divided by adjusted shares under each assumption.
    pub fn per_share(&self, dollars: &DualAssumption<YearSeries>) -> DualAssumption<YearSeries> {
        dollars.map(|a, series| series.divided_by(self.shares_adjusted.get(a)))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// `liquid − (assets − equity) − liabilities`, treating convertibles as shares.
///
/// Undefined assets or equity drop the other-liabilities term; undefined
/// liabilities drop the liabilities term.
fn net_liquidity_before_convertibles(aggregates: &ResolvedAggregates) -> YearSeries {
    let liquid = aggregates.get(Aggregate::Liquid);
    let assets = aggregates.get(Aggregate::TotalAssets);
    let equity = aggregates.get(Aggregate::TotalEquity);
    let liabilities = aggregates.get(Aggregate::Liabilities);

    (0..aggregates.num_years)
        .map(|c| {
            net_liquidity_cell(liquid.get(c), assets.get(c), equity.get(c), liabilities.get(c))
        })
        .collect()
}

fn net_liquidity_cell(liquid: Cell, assets: Cell, equity: Cell, liabilities: Cell) -> Cell {
    let liquid = liquid?;
    let other = match (assets, equity) {
        (Some(a), Some(e)) => a.checked_sub(e),
        _ => None,
    };
    match (other, liabilities) {
        (Some(other), Some(l)) => liquid.checked_sub(other)?.checked_sub(l),
        (None, Some(l)) => liquid.checked_sub(l),
        (Some(other), None) => liquid.checked_sub(other),
        (None, None) => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
