//! Numeric cell coercion.

use core::iter::Sum;
use core::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// A numeric cell value that may be missing.
///
/// Spreadsheet exports are loosely typed: a quantity column can hold `"3"`,
/// `"3.0"`, `""` or `"n/a"`. [`Quantity::coerce`] turns any cell into either a
/// finite number or [`Quantity::Missing`]; it never fails.
///
/// `Missing` is absorbing under multiplication and addition with other
/// quantities, but contributes nothing when a column is summed
/// (see the [`Sum`] impl), so a malformed line never inflates a total.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Quantity {
    Value(f64),
    #[default]
    Missing,
}

impl Quantity {
    /// Parse a cell. Blank, non-numeric and non-finite input become `Missing`.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Value(v),
            _ => Self::Missing,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            Self::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }

    /// The value, or `default` when missing.
    pub fn or(self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Missing
        }
    }
}

impl From<Option<f64>> for Quantity {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::from)
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Self::Output {
        match self {
            Self::Value(v) => Self::from(v * rhs),
            Self::Missing => Self::Missing,
        }
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Self::Output {
        match rhs {
            Self::Value(r) => self * r,
            Self::Missing => Self::Missing,
        }
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Self::Output {
        match (self, rhs) {
            (Self::Value(a), Self::Value(b)) => Self::from(a + b),
            _ => Self::Missing,
        }
    }
}

/// Column sum: missing values are skipped, an all-missing column sums to 0.
impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        Self::Value(iter.filter_map(Quantity::value).fold(0.0, |acc, v| acc + v))
    }
}

impl<'a> Sum<&'a Quantity> for Quantity {
    fn sum<I: Iterator<Item = &'a Quantity>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Value(v) => core::fmt::Display::fmt(v, f),
            Self::Missing => Ok(()),
        }
    }
}

impl ValueObject for Quantity {}
