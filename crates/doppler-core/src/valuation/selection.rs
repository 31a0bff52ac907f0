use crate::capital::{Assumption, DualAssumption};
use crate::series::YearSeries;

/// Pick, for each year, the assumption with the lower intrinsic value.
///
/// Ties go to [`Assumption::AsDebt`]. A year where either candidate is
/// undefined has no selection, and every series gated by it is undefined.
pub fn select_conservative(intrinsic_value: &DualAssumption<YearSeries>) -> Vec<Option<Assumption>> {
    assert_eq!(
        intrinsic_value.as_debt.len(),
        intrinsic_value.as_shares.len(),
        "year series must share one year axis"
    );
    intrinsic_value
        .as_debt
        .iter()
        .zip(intrinsic_value.as_shares.iter())
        .map(|pair| match pair {
            (Some(debt), Some(shares)) if shares < debt => Some(Assumption::AsShares),
            (Some(_), Some(_)) => Some(Assumption::AsDebt),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lower_value_wins_and_ties_favor_debt() {
        let dual = DualAssumption {
            as_debt: YearSeries::new(vec![Some(dec!(5)), Some(dec!(3)), Some(dec!(4)), None]),
            as_shares: YearSeries::new(vec![Some(dec!(6)), Some(dec!(2)), Some(dec!(4)), Some(dec!(1))]),
        };
        assert_eq!(
            select_conservative(&dual),
            vec![
                Some(Assumption::AsDebt),
                Some(Assumption::AsShares),
                Some(Assumption::AsDebt),
                None,
            ]
        );
    }
}
