use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::capital::Aggregate;
use crate::config::ScreenCriteria;
use crate::screening::lowball::{lowball_stats, LowballStats};
use crate::screening::reconcile::{cross_check, ppe_growth_stability, CrossCheck, PpeGrowth};
use crate::stock::StockAnalysis;
use crate::types::{Cell, Money};

/// Data-quality and suitability flags of one stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenFlags {
    /// Total assets disagree with an independent source
    pub assets_suspect: bool,
    /// Latest revenue disagrees with an independent source
    pub revenue_suspect: bool,
    /// Year-on-year PPE growth is erratic or unknown
    pub ppe_suspect: bool,
    /// Lowball return on PPE below the minimum, or unknown
    pub return_too_low: bool,
    /// Latest intrinsic value per share is not positive, or unknown
    pub no_intrinsic_value: bool,
}

impl ScreenFlags {
    pub fn any(&self) -> bool {
        self.assets_suspect
            || self.revenue_suspect
            || self.ppe_suspect
            || self.return_too_low
            || self.no_intrinsic_value
    }
}

/// Independently sourced latest-year figures to reconcile against the statement.
///
/// Each missing figure skips its cross-check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryFigures {
    pub assets: Option<Money>,
    pub revenue: Option<Money>,
}

/// Screen outcome for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenVerdict {
    pub symbol: String,
    pub name: String,
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets_check: Option<CrossCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_check: Option<CrossCheck>,
    pub ppe_growth: PpeGrowth,
    /// Lowball summary of the trailing returns on PPE
    pub return_stats: Option<LowballStats>,
    pub return_smoothed: Cell,
    pub intrinsic_value: Cell,
    pub net_liquidity: Cell,
    pub earnings: Cell,
    pub price_to_earnings: Cell,
    pub earnings_yield: Cell,
    pub price_to_book: Cell,
    pub flags: ScreenFlags,
    pub passes: bool,
}

/// Judge an analyzed stock.
///
/// Latest total assets and revenue are cross-checked against `secondary`
/// with the same dB threshold.
pub fn screen(
    analysis: &StockAnalysis,
    secondary: &SecondaryFigures,
    criteria: &ScreenCriteria,
) -> ScreenVerdict {
    let capital = &analysis.capital;
    let valuation = &analysis.valuation;

    let check_latest = |aggregate: Aggregate, figure: Option<Money>| {
        figure.map(|figure| {
            cross_check(
                capital.aggregates.get(aggregate).latest(),
                Some(figure),
                criteria.max_cross_check_db,
            )
        })
    };
    let assets_check = check_latest(Aggregate::TotalAssets, secondary.assets);
    let revenue_check = check_latest(Aggregate::Revenue, secondary.revenue);

    let ppe_growth = ppe_growth_stability(
        &capital.aggregates.get(Aggregate::Ppe),
        criteria.lowball_years,
        criteria.max_ppe_growth_dev_db,
    );

    let return_stats = valuation
        .cash_flows
        .return_ppe
        .trailing(criteria.lowball_years)
        .and_then(|returns| lowball_stats(&returns).ok());

    let intrinsic_value = valuation.selected.intrinsic_value.latest();

    let flags = ScreenFlags {
        assets_suspect: assets_check.as_ref().is_some_and(|c| c.suspect),
        revenue_suspect: revenue_check.as_ref().is_some_and(|c| c.suspect),
        ppe_suspect: ppe_growth.suspect,
        return_too_low: return_stats
            .as_ref()
            .map_or(true, |s| s.lowball < criteria.min_lowball_return),
        no_intrinsic_value: intrinsic_value.map_or(true, |v| v <= Decimal::ZERO),
    };

    tracing::debug!(symbol = %analysis.symbol, passes = !flags.any(), "screened stock");

    ScreenVerdict {
        symbol: analysis.symbol.clone(),
        name: analysis.name.clone(),
        price: analysis.price,
        assets_check,
        revenue_check,
        ppe_growth,
        return_stats,
        return_smoothed: valuation.cash_flows.return_ppe_smoothed.latest(),
        intrinsic_value,
        net_liquidity: valuation.selected.net_liquidity.latest(),
        earnings: analysis.ratios.earnings,
        price_to_earnings: analysis.ratios.price_to_earnings,
        earnings_yield: analysis.ratios.earnings_yield,
        price_to_book: analysis.ratios.price_to_book,
        flags,
        passes: !flags.any(),
    }
}

/// Unfiltered and passing-only lists, in input order.
pub fn partition(verdicts: Vec<ScreenVerdict>) -> (Vec<ScreenVerdict>, Vec<ScreenVerdict>) {
    let passing = verdicts.iter().filter(|v| v.passes).cloned().collect();
    (verdicts, passing)
}
