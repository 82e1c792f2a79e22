//! Academic credit units.
//!
//! Units are stored as an integer count of tenths so sums and comparisons
//! are exact. On the wire they are plain decimal numbers (`4`, `1.5`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Credit units in tenths (`Units::from_tenths(45)` is 4.5 units).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Units(u32);

impl Units {
    /// Zero units.
    pub const ZERO: Units = Units(0);

    /// Creates units from a count of tenths.
    pub const fn from_tenths(tenths: u32) -> Self {
        Units(tenths)
    }

    /// Creates a whole number of units.
    pub const fn whole(units: u32) -> Self {
        Units(units * 10)
    }

    /// Converts a decimal value, rounding to the nearest tenth.
    ///
    /// Returns `None` for negative, non-finite, or out-of-range values.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let tenths = (value * 10.0).round();
        if tenths > u32::MAX as f64 {
            return None;
        }
        Some(Units(tenths as u32))
    }

    /// Count of tenths.
    #[inline]
    pub fn tenths(self) -> u32 {
        self.0
    }

    /// Decimal value.
    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 10.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Units {
    type Output = Units;

    fn add(self, rhs: Units) -> Units {
        Units(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Units {
    type Output = Units;

    /// Saturates at zero.
    fn sub(self, rhs: Units) -> Units {
        Units(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Units {
    fn sum<I: Iterator<Item = Units>>(iter: I) -> Units {
        iter.fold(Units::ZERO, |acc, u| acc + u)
    }
}

impl<'a> Sum<&'a Units> for Units {
    fn sum<I: Iterator<Item = &'a Units>>(iter: I) -> Units {
        iter.copied().sum()
    }
}

impl TryFrom<f64> for Units {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Units::from_f64(value).ok_or_else(|| format!("invalid unit value: {value}"))
    }
}

impl From<Units> for f64 {
    fn from(units: Units) -> f64 {
        units.as_f64()
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}
