//! Year-aligned series algebra.
//!
//! Every derived quantity in the engine is a [`YearSeries`]: one optional
//! `Decimal` per fiscal year, oldest first, so that index `c - 1` is always the
//! prior year. The handful of primitives here (element-wise arithmetic, lag,
//! trailing moving average) replace one-method-per-line derivations.
//!
//! Undefined cells propagate through every operation. Division by zero and
//! arithmetic overflow produce undefined cells rather than errors.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Cell;

/// How a trailing moving average treats undefined cells inside its window.
///
/// In both policies the window is truncated at the start of the series, so the
/// early years average over however many years exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Any undefined cell in the window makes that position undefined.
    #[default]
    Strict,
    /// Undefined cells are dropped from both the sum and the count; the
    /// position is undefined only when the window holds no defined cell.
    SkipMissing,
}

/// Dense per-year series, oldest year first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearSeries(Vec<Cell>);

impl YearSeries {
    pub fn new(values: Vec<Cell>) -> Self {
        Self(values)
    }

    /// A series with every year undefined.
    pub fn undefined(len: usize) -> Self {
        Self(vec![None; len])
    }

    /// A series with the same defined value in every year.
    pub fn filled(len: usize, value: Decimal) -> Self {
        Self(vec![Some(value); len])
    }

    pub fn zeros(len: usize) -> Self {
        Self::filled(len, Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value for year index `c`; out-of-range indices are undefined.
    pub fn get(&self, c: usize) -> Cell {
        self.0.get(c).copied().flatten()
    }

    /// Value for the most recent year.
    pub fn latest(&self) -> Cell {
        self.0.last().copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.0.iter().copied()
    }

    pub fn is_all_undefined(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    pub fn map(&self, f: impl Fn(Decimal) -> Cell) -> Self {
        Self(self.0.iter().map(|cell| cell.and_then(&f)).collect())
    }

    /// Combine two series cell by cell, seeing undefined cells as `None`.
    ///
    /// Panics when the series do not share the same year axis.
    pub fn zip_cells(&self, other: &YearSeries, f: impl Fn(Cell, Cell) -> Cell) -> Self {
        assert_eq!(
            self.len(),
            other.len(),
            "year series must share one year axis"
        );
        Self(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| f(*a, *b))
                .collect(),
        )
    }

    /// Combine two series where both cells are defined; otherwise undefined.
    pub fn zip_with(&self, other: &YearSeries, f: impl Fn(Decimal, Decimal) -> Cell) -> Self {
        self.zip_cells(other, |a, b| match (a, b) {
            (Some(a), Some(b)) => f(a, b),
            _ => None,
        })
    }

    pub fn plus(&self, other: &YearSeries) -> Self {
        self.zip_with(other, |a, b| a.checked_add(b))
    }

    pub fn minus(&self, other: &YearSeries) -> Self {
        self.zip_with(other, |a, b| a.checked_sub(b))
    }

    pub fn times(&self, other: &YearSeries) -> Self {
        self.zip_with(other, |a, b| a.checked_mul(b))
    }

    /// Element-wise division; a zero divisor yields an undefined cell.
    pub fn divided_by(&self, other: &YearSeries) -> Self {
        self.zip_with(other, |a, b| a.checked_div(b))
    }

    pub fn scale(&self, k: Decimal) -> Self {
        self.map(|v| v.checked_mul(k))
    }

    /// `self - other`, keeping `self` alone where `other` is undefined.
    pub fn minus_or_keep(&self, other: &YearSeries) -> Self {
        self.zip_cells(other, |a, b| match (a, b) {
            (Some(a), Some(b)) => a.checked_sub(b),
            (Some(a), None) => Some(a),
            (None, _) => None,
        })
    }

    /// Shift values `k` years later: `out[c] = self[c - k]`, undefined for `c < k`.
    pub fn lag(&self, k: usize) -> Self {
        Self(
            (0..self.len())
                .map(|c| if c < k { None } else { self.get(c - k) })
                .collect(),
        )
    }

    /// Replace undefined cells with zero.
    pub fn or_zero(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|cell| Some(cell.unwrap_or(Decimal::ZERO)))
                .collect(),
        )
    }

    /// Trailing `window`-year moving average ending at each year.
    pub fn moving_average(&self, window: usize, policy: WindowPolicy) -> Self {
        if window == 0 {
            return Self::undefined(self.len());
        }
        Self(
            (0..self.len())
                .map(|c| {
                    let start = (c + 1).saturating_sub(window);
                    trailing_mean(&self.0[start..=c], policy)
                })
                .collect(),
        )
    }

    /// The last `n` values, only when all of them are defined.
    pub fn trailing(&self, n: usize) -> Option<Vec<Decimal>> {
        if n == 0 || n > self.len() {
            return None;
        }
        self.0[self.len() - n..].iter().copied().collect()
    }

    /// Weighted sum of several series: `Σ weight_i × series_i`.
    ///
    /// Any undefined term makes the year undefined.
    pub fn weighted_sum(len: usize, terms: &[(Decimal, &YearSeries)]) -> Self {
        terms
            .iter()
            .fold(Self::zeros(len), |acc, (weight, series)| {
                acc.plus(&series.scale(*weight))
            })
    }
}

fn trailing_mean(window: &[Cell], policy: WindowPolicy) -> Cell {
    let defined: Vec<Decimal> = match policy {
        WindowPolicy::Strict => window.iter().copied().collect::<Option<Vec<_>>>()?,
        WindowPolicy::SkipMissing => window.iter().flatten().copied().collect(),
    };
    if defined.is_empty() {
        return None;
    }
    let total = defined
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    total.checked_div(Decimal::from(defined.len()))
}

impl From<Vec<Cell>> for YearSeries {
    fn from(values: Vec<Cell>) -> Self {
        Self(values)
    }
}

impl FromIterator<Cell> for YearSeries {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
