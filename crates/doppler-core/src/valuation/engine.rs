use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::capital::{Aggregate, Assumption, CapitalStructure, DualAssumption};
use crate::config::ValuationConfig;
use crate::series::YearSeries;
use crate::valuation::selection::select_conservative;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Signed terms of pre-tax cash flow.
pub const CASH_FLOW_TERMS: [(Aggregate, Decimal); 7] = [
    (Aggregate::OperatingCashFlow, Decimal::ONE),
    (Aggregate::IncomeTax, Decimal::ONE),
    (Aggregate::CostsToFinancing, Decimal::ONE),
    (Aggregate::LossesToInvesting, Decimal::ONE),
    (Aggregate::ReclassifiedToOperating, Decimal::ONE),
    (Aggregate::IncomeToFinancing, Decimal::NEGATIVE_ONE),
    (Aggregate::GainsToInvesting, Decimal::NEGATIVE_ONE),
];

/// Lags applied to the smoothed return and per-share PPE when projecting
/// free cash flow per share: `fcf_ps[c] = smoothed[c - return_lag] × ppe_ps[c - ppe_lag]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub return_lag: usize,
    pub ppe_lag: usize,
}

/// Free-cash-flow-per-share variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FcfProjection {
    /// This year's smoothed return on last year's capital base
    Smoothed,
    /// Last year's smoothed return on last year's capital base
    Projected,
}

impl FcfProjection {
    pub fn projection(self) -> Projection {
        match self {
            FcfProjection::Smoothed => Projection {
                return_lag: 0,
                ppe_lag: 1,
            },
            FcfProjection::Projected => Projection {
                return_lag: 1,
                ppe_lag: 1,
            },
        }
    }
}

/// Per-year dollar and rate series that do not depend on the share count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowSeries {
    /// Normalized capital spending
    pub capex: YearSeries,
    /// Pre-tax cash flow after reclassifications
    pub cash_flow: YearSeries,
    pub fcf: YearSeries,
    /// Free cash flow over prior-year PPE
    pub return_ppe: YearSeries,
    pub return_ppe_smoothed: YearSeries,
}

/// Per-share series under both assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerShareSeries {
    pub net_liquidity: DualAssumption<YearSeries>,
    pub ppe: DualAssumption<YearSeries>,
    pub fcf_smoothed: DualAssumption<YearSeries>,
    pub fcf_projected: DualAssumption<YearSeries>,
    pub intrinsic_value: DualAssumption<YearSeries>,
}

/// Per-share series realized under the selected assumption of each year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedSeries {
    pub net_liquidity: YearSeries,
    pub ppe: YearSeries,
    pub fcf_smoothed: YearSeries,
    pub fcf_projected: YearSeries,
    pub intrinsic_value: YearSeries,
}

/// Full valuation of one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valuation {
    pub cash_flows: CashFlowSeries,
    pub per_share: PerShareSeries,
    /// Conservative assumption per year; `None` where it cannot be decided
    pub selector: Vec<Option<Assumption>>,
    pub selected: SelectedSeries,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value a resolved capital structure.
pub fn value(structure: &CapitalStructure, config: &ValuationConfig) -> Valuation {
    let cash_flows = cash_flow_series(structure, config);
    let per_share = per_share_series(structure, &cash_flows, config);
    let selector = select_conservative(&per_share.intrinsic_value);

    let selected = SelectedSeries {
        net_liquidity: per_share.net_liquidity.select(&selector),
        ppe: per_share.ppe.select(&selector),
        fcf_smoothed: per_share.fcf_smoothed.select(&selector),
        fcf_projected: per_share.fcf_projected.select(&selector),
        intrinsic_value: per_share.intrinsic_value.select(&selector),
    };

    tracing::debug!(
        years = structure.num_years(),
        selected_years = selector.iter().filter(|s| s.is_some()).count(),
        "valuation complete"
    );

    Valuation {
        cash_flows,
        per_share,
        selector,
        selected,
    }
}

/// Capital spending, free cash flow and return on PPE.
pub fn cash_flow_series(structure: &CapitalStructure, config: &ValuationConfig) -> CashFlowSeries {
    let n = structure.num_years();
    let ppe = structure.aggregates.get(Aggregate::Ppe);
    let prior_ppe = ppe.lag(1);

    let capex = prior_ppe.scale(config.capex_rate);
    let cash_flow = pre_tax_cash_flow(structure);
    let fcf = cash_flow.minus(&capex);
    let return_ppe = fcf.divided_by(&prior_ppe);
    let return_ppe_smoothed = return_ppe.moving_average(config.smoothing_window, config.window_policy);

    debug_assert_eq!(return_ppe_smoothed.len(), n);
    CashFlowSeries {
        capex,
        cash_flow,
        fcf,
        return_ppe,
        return_ppe_smoothed,
    }
}

/// Weighted sum of [`CASH_FLOW_TERMS`].
pub fn pre_tax_cash_flow(structure: &CapitalStructure) -> YearSeries {
    let terms: Vec<(Decimal, YearSeries)> = CASH_FLOW_TERMS
        .iter()
        .map(|(aggregate, weight)| (*weight, structure.aggregates.get(*aggregate)))
        .collect();
    let borrowed: Vec<(Decimal, &YearSeries)> = terms.iter().map(|(w, s)| (*w, s)).collect();
    YearSeries::weighted_sum(structure.num_years(), &borrowed)
}

/// Free cash flow per share for one projection.
pub fn project_fcf(smoothed_return: &YearSeries, ppe_ps: &YearSeries, projection: Projection) -> YearSeries {
    smoothed_return
        .lag(projection.return_lag)
        .times(&ppe_ps.lag(projection.ppe_lag))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn per_share_series(
    structure: &CapitalStructure,
    cash_flows: &CashFlowSeries,
    config: &ValuationConfig,
) -> PerShareSeries {
    let ppe = structure.aggregates.get(Aggregate::Ppe);
    let net_liquidity = structure.per_share(&structure.net_liquidity);
    let ppe_ps = structure.per_share(&DualAssumption::from_fn(|_| ppe.clone()));

    let smoothed = &cash_flows.return_ppe_smoothed;
    let fcf_smoothed = ppe_ps.map(|_, p| project_fcf(smoothed, p, FcfProjection::Smoothed.projection()));
    let fcf_projected = ppe_ps.map(|_, p| project_fcf(smoothed, p, FcfProjection::Projected.projection()));

    // netliq_ps[c-1] + multiple × fcf_projected[c]
    let intrinsic_value = DualAssumption::from_fn(|a| {
        net_liquidity
            .get(a)
            .lag(1)
            .plus(&fcf_projected.get(a).scale(config.capitalization_multiple))
    });

    PerShareSeries {
        net_liquidity,
        ppe: ppe_ps,
        fcf_smoothed,
        fcf_projected,
        intrinsic_value,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capital::resolve;
    use crate::codes::CodeTable;
    use crate::series::WindowPolicy;
    use crate::statement::normalize_rows;
    use rust_decimal_macros::dec;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn codes() -> CodeTable {
        CodeTable::from_rows(&[
            row(&["Description", "Code", "Sign", "General"]),
            row(&["Cash", "CASH", "1", "liq"]),
            row(&["Long-term debt", "LTD", "1", "liab"]),
            row(&["Net PPE", "PPE", "1", "ppec"]),
            row(&["Operating cash flow", "CFO", "1", "CF_P"]),
            row(&["Income tax", "TAX", "1", "CF_N2T"]),
            row(&["Interest income", "INTI", "1", "CF_P2F"]),
            row(&["Common shares", "SHR", "1", "shares"]),
            row(&["Convertible notes", "CNV", "1", "liabc"]),
            row(&["Convertible preferred", "CPS", "1", "sharesc"]),
        ])
        .unwrap()
    }

    /// Years 2020..2023; rows are written newest first.
    fn structure(items: &[Vec<String>]) -> CapitalStructure {
        let mut rows = vec![
            row(&["Year", "", "2023", "2022", "2021", "2020"]),
            row(&["Split", "split", "1", "1", "1", "1"]),
            row(&["Units", "un+", "1", "1", "1", "1"]),
        ];
        rows.extend_from_slice(items);
        resolve(&normalize_rows(&rows, &codes()).unwrap())
    }

    fn growth_case() -> CapitalStructure {
        structure(&[
            row(&["Cash", "CASH", "0", "0", "0", "0"]),
            row(&["Long-term debt", "LTD", "0", "0", "0", "0"]),
            row(&["Net PPE", "PPE", "133.1", "121", "110", "100"]),
            row(&["Operating cash flow", "CFO", "39.93", "36.3", "33", "30"]),
            row(&["Common shares", "SHR", "10", "10", "10", "10"]),
        ])
    }

    #[test]
    fn test_capex_and_return_on_ppe() {
        let cf = cash_flow_series(&growth_case(), &ValuationConfig::default());
        assert_eq!(cf.capex.get(0), None);
        assert_eq!(cf.capex.get(1), Some(dec!(10)));
        assert_eq!(cf.fcf.get(1), Some(dec!(23)));
        assert_eq!(cf.return_ppe.get(0), None);
        assert_eq!(cf.return_ppe.get(1), Some(dec!(0.23)));
        assert_eq!(cf.return_ppe.get(2), Some(dec!(0.23)));
        assert_eq!(cf.return_ppe.get(3), Some(dec!(0.23)));
    }

    #[test]
    fn test_strict_smoothing_leaves_first_years_undefined() {
        let cf = cash_flow_series(&growth_case(), &ValuationConfig::default());
        // the first return is undefined and sits in every 4-year window
        assert!(cf.return_ppe_smoothed.is_all_undefined());

        let cfg = ValuationConfig {
            window_policy: WindowPolicy::SkipMissing,
            ..ValuationConfig::default()
        };
        let cf = cash_flow_series(&growth_case(), &cfg);
        assert_eq!(cf.return_ppe_smoothed.get(0), None);
        assert_eq!(cf.return_ppe_smoothed.get(3), Some(dec!(0.23)));
    }

    #[test]
    fn test_reclassifications_adjust_cash_flow() {
        let cs = structure(&[
            row(&["Operating cash flow", "CFO", "100", "100", "100", "100"]),
            row(&["Income tax", "TAX", "20", "20", "20", "20"]),
            row(&["Interest income", "INTI", "5", "5", "5", "5"]),
        ]);
        assert_eq!(pre_tax_cash_flow(&cs), YearSeries::filled(4, dec!(115)));
    }

    #[test]
    fn test_undefined_operating_cash_flow_is_undefined() {
        let cs = structure(&[row(&["Income tax", "TAX", "20", "20", "20", "20"])]);
        assert!(pre_tax_cash_flow(&cs).is_all_undefined());
    }

    #[test]
    fn test_intrinsic_value_uses_prior_year() {
        let cfg = ValuationConfig {
            smoothing_window: 1,
            ..ValuationConfig::default()
        };
        let v = value(&growth_case(), &cfg);
        // 2022: netliq_ps[2021] + 10 × ppe_ps[2021] × smoothed[2021] = 0 + 10 × 11 × 0.23
        assert_eq!(v.per_share.intrinsic_value.as_debt.get(2), Some(dec!(25.3)));
        assert_eq!(v.per_share.intrinsic_value.as_debt.get(1), None);
        assert_eq!(v.selector[2], Some(Assumption::AsDebt));
        assert_eq!(v.selected.intrinsic_value.get(2), Some(dec!(25.3)));
    }

    #[test]
    fn test_smoothed_and_projected_fcf_lags() {
        let cfg = ValuationConfig {
            smoothing_window: 1,
            ..ValuationConfig::default()
        };
        let v = value(&growth_case(), &cfg);
        // smoothed: smoothed[2021] × ppe_ps[2020] = 0.23 × 10
        assert_eq!(v.per_share.fcf_smoothed.as_debt.get(1), Some(dec!(2.3)));
        // projected: smoothed[2020] is undefined
        assert_eq!(v.per_share.fcf_projected.as_debt.get(1), None);
        assert_eq!(v.per_share.fcf_projected.as_debt.get(2), Some(dec!(2.53)));
    }

    #[test]
    fn test_selection_gates_every_series() {
        let cfg = ValuationConfig {
            smoothing_window: 1,
            ..ValuationConfig::default()
        };
        let cs = structure(&[
            row(&["Cash", "CASH", "100", "100", "100", "100"]),
            row(&["Long-term debt", "LTD", "0", "0", "0", "0"]),
            row(&["Net PPE", "PPE", "133.1", "121", "110", "100"]),
            row(&["Operating cash flow", "CFO", "39.93", "36.3", "33", "30"]),
            row(&["Common shares", "SHR", "10", "10", "10", "10"]),
            row(&["Convertible notes", "CNV", "90", "90", "90", "90"]),
            row(&["Convertible preferred", "CPS", "10", "10", "10", "10"]),
        ]);
        let v = value(&cs, &cfg);
        for c in 2..4 {
            let choice = v.selector[c].unwrap();
            assert_eq!(v.selected.net_liquidity.get(c), v.per_share.net_liquidity.get(choice).get(c));
            assert_eq!(v.selected.ppe.get(c), v.per_share.ppe.get(choice).get(c));
            assert_eq!(
                v.selected.fcf_projected.get(c),
                v.per_share.fcf_projected.get(choice).get(c)
            );
        }
        // as debt: 1 + 10 × 11 × 0.23 = 26.3; as shares: 5 + 10 × 5.5 × 0.23 = 17.65
        assert_eq!(v.per_share.intrinsic_value.as_debt.get(2), Some(dec!(26.3)));
        assert_eq!(v.per_share.intrinsic_value.as_shares.get(2), Some(dec!(17.65)));
        assert_eq!(v.selector[2], Some(Assumption::AsShares));
    }
}
