use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DopplerError;
use crate::screening::lowball::{mean, sample_std_dev};
use crate::series::YearSeries;
use crate::types::{with_metadata, Cell, ComputationOutput, Money};
use crate::DopplerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Two independently sourced figures for the same quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileInput {
    pub primary: Money,
    pub secondary: Money,
    /// Suspect threshold in dB (default 2)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_db: Option<Decimal>,
}

/// Outcome of a decibel cross-check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossCheck {
    pub primary: Cell,
    pub secondary: Cell,
    /// |10·log10(primary / secondary)|
    pub gap_db: Cell,
    pub threshold_db: Decimal,
    /// Gap at or above the threshold, or not computable
    pub suspect: bool,
}

/// Stability of year-on-year PPE growth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpeGrowth {
    /// Growth of each trailing year in dB, oldest first
    pub growth_db: Vec<Cell>,
    pub mean_db: Cell,
    pub std_dev_db: Cell,
    pub threshold_db: Decimal,
    pub suspect: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `10·log10(x)`; undefined for non-positive `x`.
pub fn db(x: Decimal) -> Cell {
    if x <= Decimal::ZERO {
        return None;
    }
    x.log10().checked_mul(dec!(10))
}

/// Compare two figures; suspect when they differ by `threshold_db` or more.
pub fn cross_check(primary: Cell, secondary: Cell, threshold_db: Decimal) -> CrossCheck {
    let gap_db = primary
        .zip(secondary)
        .and_then(|(a, b)| a.checked_div(b))
        .and_then(db)
        .map(|g| g.abs());
    CrossCheck {
        primary,
        secondary,
        gap_db,
        threshold_db,
        suspect: gap_db.map_or(true, |g| g >= threshold_db),
    }
}

/// Cross-check wrapped in the standard output envelope.
pub fn reconcile(input: &ReconcileInput) -> DopplerResult<ComputationOutput<CrossCheck>> {
    let start = Instant::now();
    let threshold_db = input.threshold_db.unwrap_or(dec!(2));
    if threshold_db <= Decimal::ZERO {
        return Err(DopplerError::InvalidInput {
            field: "threshold_db".into(),
            reason: "Threshold must be positive".into(),
        });
    }

    let check = cross_check(Some(input.primary), Some(input.secondary), threshold_db);
    let mut warnings = Vec::new();
    if check.gap_db.is_none() {
        warnings.push("Ratio of the two figures is not positive; treated as suspect".to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Decibel cross-check: |10 log10(primary / secondary)| against threshold",
        &serde_json::json!({ "threshold_db": threshold_db.to_string() }),
        warnings,
        elapsed,
        check,
    ))
}

/// Growth statistics over the last `years` year-on-year PPE ratios.
///
/// Needs `years + 1` trailing defined PPE values; otherwise every statistic is
/// undefined and the series is suspect.
pub fn ppe_growth_stability(ppe: &YearSeries, years: usize, threshold_db: Decimal) -> PpeGrowth {
    let growth_db: Vec<Cell> = match ppe.trailing(years + 1) {
        Some(values) => values
            .windows(2)
            .map(|w| w[1].checked_div(w[0]).and_then(db))
            .collect(),
        None => vec![None; years],
    };

    let defined: Option<Vec<Decimal>> = growth_db.iter().copied().collect();
    let (mean_db, std_dev_db) = match defined {
        Some(values) => (mean(&values), sample_std_dev(&values)),
        None => (None, None),
    };

    PpeGrowth {
        growth_db,
        mean_db,
        std_dev_db,
        threshold_db,
        suspect: std_dev_db.map_or(true, |d| d >= threshold_db),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
