use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::DopplerError;
use crate::types::{with_metadata, Cell, ComputationOutput};
use crate::DopplerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Sample to summarize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowballInput {
    pub values: Vec<Decimal>,
}

/// Robust summary of a small sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowballStats {
    pub count: usize,
    pub mean: Decimal,
    /// Sample standard deviation (n − 1 denominator)
    pub std_dev: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    /// |std_dev / mean|; undefined for a zero mean
    pub relative_std_dev: Cell,
    /// `max(min, mean − std_dev)`; never below the observed minimum
    pub lowball: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lowball statistic wrapped in the standard output envelope.
pub fn calculate_lowball(input: &LowballInput) -> DopplerResult<ComputationOutput<LowballStats>> {
    let start = Instant::now();
    let stats = lowball_stats(&input.values)?;

    let mut warnings = Vec::new();
    if stats.relative_std_dev.is_some_and(|r| r > Decimal::ONE) {
        warnings.push(format!(
            "Sample is highly dispersed: relative standard deviation {}",
            stats.relative_std_dev.unwrap_or_default().round_dp(4)
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lowball estimate: max(minimum, mean - sample standard deviation)",
        &serde_json::json!({ "count": stats.count }),
        warnings,
        elapsed,
        stats,
    ))
}

/// Summarize at least two values.
pub fn lowball_stats(values: &[Decimal]) -> DopplerResult<LowballStats> {
    if values.len() < 2 {
        return Err(DopplerError::InsufficientData(format!(
            "lowball needs at least 2 values, got {}",
            values.len()
        )));
    }
    let overflow = || DopplerError::InvalidInput {
        field: "values".into(),
        reason: "values are too large to summarize".into(),
    };

    let mean = mean(values).ok_or_else(overflow)?;
    let std_dev = sample_std_dev(values).ok_or_else(overflow)?;
    let min = values.iter().copied().fold(values[0], Decimal::min);
    let max = values.iter().copied().fold(values[0], Decimal::max);
    let relative_std_dev = std_dev.checked_div(mean).map(|r| r.abs());
    let lowball = mean.checked_sub(std_dev).map_or(min, |floor| floor.max(min));

    Ok(LowballStats {
        count: values.len(),
        mean,
        std_dev,
        min,
        max,
        relative_std_dev,
        lowball,
    })
}

/// Arithmetic mean; undefined for an empty sample or on overflow.
pub fn mean(values: &[Decimal]) -> Cell {
    if values.is_empty() {
        return None;
    }
    let total = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    total.checked_div(Decimal::from(values.len()))
}

/// Sample standard deviation; undefined below two values.
pub fn sample_std_dev(values: &[Decimal]) -> Cell {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let dev = v.checked_sub(mean)?;
        acc.checked_add(dev.checked_mul(dev)?)
    })?;
    let variance = sum_sq.checked_div(Decimal::from(values.len() - 1))?;
    variance.sqrt()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
