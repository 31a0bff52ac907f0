//! Flat report rows for renderers.
//!
//! Year rows run newest first, the order in which statements are read.
//! Undefined cells stay `None` and serialize as `null`; renderers show them
//! as `N/A`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::capital::{Aggregate, Assumption};
use crate::stock::StockAnalysis;
use crate::types::{Cell, Money};

/// Latest-year scalars and identification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub symbol: String,
    pub name: String,
    pub price: Option<Money>,
    pub report_date: NaiveDate,
    pub latest_year: Option<String>,
    pub latest_assumption: Option<Assumption>,
    pub intrinsic_value: Cell,
    pub earnings: Cell,
    pub book_value: Cell,
    pub price_to_book: Cell,
    pub price_adjusted: Cell,
    pub price_to_earnings: Cell,
    pub earnings_yield: Cell,
}

/// One fiscal year of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRow {
    pub year: String,
    pub assumption: Option<Assumption>,
    pub intrinsic_value_ps: Cell,
    pub net_liquidity_ps: Cell,
    pub fcf_projected_ps: Cell,
    pub fcf_smoothed_ps: Cell,
    pub ppe_ps: Cell,
    pub return_ppe: Cell,
    pub return_ppe_smoothed: Cell,
    pub split_factor: Cell,
    pub shares_nominal: Cell,
    pub shares_adjusted: Cell,
    pub liquid: Cell,
    pub total_assets: Cell,
    pub total_equity: Cell,
    pub liabilities: Cell,
    pub convertible_liabilities: Cell,
    pub ppe: Cell,
    pub cash_flow: Cell,
    pub capex: Cell,
    pub fcf: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReport {
    pub summary: ReportSummary,
    pub years: Vec<YearRow>,
}

impl StockReport {
    pub fn from_analysis(analysis: &StockAnalysis, report_date: NaiveDate) -> Self {
        let valuation = &analysis.valuation;
        let selected = &valuation.selected;
        let cash_flows = &valuation.cash_flows;
        let aggregates = &analysis.capital.aggregates;
        let shares_adjusted = analysis.capital.shares_adjusted.select(&valuation.selector);

        let liquid = aggregates.get(Aggregate::Liquid);
        let total_assets = aggregates.get(Aggregate::TotalAssets);
        let total_equity = aggregates.get(Aggregate::TotalEquity);
        let liabilities = aggregates.get(Aggregate::Liabilities);
        let convertible_liabilities = aggregates.get(Aggregate::ConvertibleLiabilities);
        let shares = aggregates.get(Aggregate::Shares);
        let ppe = aggregates.get(Aggregate::Ppe);

        let years = analysis
            .years
            .iter()
            .enumerate()
            .rev()
            .map(|(c, year)| YearRow {
                year: year.clone(),
                assumption: valuation.selector.get(c).copied().flatten(),
                intrinsic_value_ps: selected.intrinsic_value.get(c),
                net_liquidity_ps: selected.net_liquidity.get(c),
                fcf_projected_ps: selected.fcf_projected.get(c),
                fcf_smoothed_ps: selected.fcf_smoothed.get(c),
                ppe_ps: selected.ppe.get(c),
                return_ppe: cash_flows.return_ppe.get(c),
                return_ppe_smoothed: cash_flows.return_ppe_smoothed.get(c),
                split_factor: analysis.capital.split_factors.get(c),
                shares_nominal: shares.get(c),
                shares_adjusted: shares_adjusted.get(c),
                liquid: liquid.get(c),
                total_assets: total_assets.get(c),
                total_equity: total_equity.get(c),
                liabilities: liabilities.get(c),
                convertible_liabilities: convertible_liabilities.get(c),
                ppe: ppe.get(c),
                cash_flow: cash_flows.cash_flow.get(c),
                capex: cash_flows.capex.get(c),
                fcf: cash_flows.fcf.get(c),
            })
            .collect();

        let ratios = &analysis.ratios;
        let summary = ReportSummary {
            symbol: analysis.symbol.clone(),
            name: analysis.name.clone(),
            price: analysis.price,
            report_date,
            latest_year: analysis.latest_year().map(str::to_string),
            latest_assumption: valuation.selector.last().copied().flatten(),
            intrinsic_value: selected.intrinsic_value.latest(),
            earnings: ratios.earnings,
            book_value: ratios.book_value,
            price_to_book: ratios.price_to_book,
            price_adjusted: ratios.price_adjusted,
            price_to_earnings: ratios.price_to_earnings,
            earnings_yield: ratios.earnings_yield,
        };

        Self { summary, years }
    }
}
