use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Cell, Money};
use crate::valuation::engine::Valuation;

/// Latest-year scalars, each independently best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestRatios {
    /// Per-share PPE × smoothed return, both for the latest year
    pub earnings: Cell,
    /// `multiple × earnings + net liquidity per share`
    pub book_value: Cell,
    pub price_to_book: Cell,
    /// Price less net liquidity per share
    pub price_adjusted: Cell,
    pub price_to_earnings: Cell,
    pub earnings_yield: Cell,
}

/// Compute the latest-year ratios from the selected-assumption series.
///
/// Earnings use the current year's PPE and smoothed return, whereas the
/// intrinsic-value series projects from the prior year.
pub fn latest_ratios(valuation: &Valuation, price: Option<Money>, multiple: Decimal) -> LatestRatios {
    let ppe_ps = valuation.selected.ppe.latest();
    let smoothed = valuation.cash_flows.return_ppe_smoothed.latest();
    let net_liquidity_ps = valuation.selected.net_liquidity.latest();
    compute_ratios(ppe_ps, smoothed, net_liquidity_ps, price, multiple)
}

/// The ratio chain over plain latest-year inputs.
///
/// Only a zero or undefined denominator leaves a ratio undefined. Negative
/// earnings give a negative P/E and earnings yield, and a negative book value
/// gives a negative P/B, so loss-makers still sort and print.
pub fn compute_ratios(
    ppe_ps: Cell,
    smoothed_return: Cell,
    net_liquidity_ps: Cell,
    price: Option<Money>,
    multiple: Decimal,
) -> LatestRatios {
    let earnings = ppe_ps.zip(smoothed_return).and_then(|(p, r)| p.checked_mul(r));
    let book_value = earnings
        .and_then(|e| e.checked_mul(multiple))
        .zip(net_liquidity_ps)
        .and_then(|(e, n)| e.checked_add(n));
    let price_to_book = price.zip(book_value).and_then(|(p, b)| p.checked_div(b));
    let price_adjusted = price
        .zip(net_liquidity_ps)
        .and_then(|(p, n)| p.checked_sub(n));
    let price_to_earnings = price_adjusted
        .zip(earnings)
        .and_then(|(p, e)| p.checked_div(e));
    let earnings_yield = price_to_earnings.and_then(|pe| Decimal::ONE.checked_div(pe));

    LatestRatios {
        earnings,
        book_value,
        price_to_book,
        price_adjusted,
        price_to_earnings,
        earnings_yield,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ratio_chain() {
        let r = compute_ratios(
            Some(dec!(20)),
            Some(dec!(0.1)),
            Some(dec!(5)),
            Some(dec!(30)),
            dec!(10),
        );
        assert_eq!(r.earnings, Some(dec!(2)));
        assert_eq!(r.book_value, Some(dec!(25)));
        assert_eq!(r.price_to_book, Some(dec!(1.2)));
        assert_eq!(r.price_adjusted, Some(dec!(25)));
        assert_eq!(r.price_to_earnings, Some(dec!(12.5)));
        assert_eq!(r.earnings_yield, Some(dec!(0.08)));
    }

    #[test]
    fn test_zero_earnings_leaves_dependent_ratios_undefined() {
        let r = compute_ratios(
            Some(dec!(20)),
            Some(dec!(0)),
            Some(dec!(5)),
            Some(dec!(30)),
            dec!(10),
        );
        assert_eq!(r.earnings, Some(dec!(0)));
        assert_eq!(r.book_value, Some(dec!(5)));
        assert_eq!(r.price_to_earnings, None);
        assert_eq!(r.earnings_yield, None);
        assert_eq!(r.price_adjusted, Some(dec!(25)));
    }

    #[test]
    fn test_negative_earnings_keep_signed_ratios() {
        let r = compute_ratios(
            Some(dec!(20)),
            Some(dec!(-0.1)),
            Some(dec!(5)),
            Some(dec!(30)),
            dec!(10),
        );
        assert_eq!(r.earnings, Some(dec!(-2)));
        assert_eq!(r.book_value, Some(dec!(-15)));
        assert_eq!(r.price_to_book, Some(dec!(-2)));
        assert_eq!(r.price_to_earnings, Some(dec!(-12.5)));
        assert_eq!(r.earnings_yield, Some(dec!(-0.08)));
    }

    #[test]
    fn test_missing_price() {
        let r = compute_ratios(Some(dec!(20)), Some(dec!(0.1)), Some(dec!(5)), None, dec!(10));
        assert_eq!(r.book_value, Some(dec!(25)));
        assert_eq!(r.price_to_book, None);
        assert_eq!(r.price_adjusted, None);
        assert_eq!(r.earnings_yield, None);
    }
}
