//! Transaction amount model.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::error::{PromptPayError, Result};

/// A non-negative amount that locks a payment code to one value.
///
/// Always encoded with exactly two fractional digits and no thousands
/// separators.
///
/// ```
/// use promptpay_rs::models::MonetaryAmount;
///
/// assert_eq!(MonetaryAmount::new(125.0)?.formatted(), "125.00");
/// assert_eq!("4.5".parse::<MonetaryAmount>()?.formatted(), "4.50");
/// # Ok::<(), promptpay_rs::error::PromptPayError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct MonetaryAmount(f64);

impl MonetaryAmount {
    /// Wraps a value after checking that it is finite and not negative.
    ///
    /// # Errors
    ///
    /// Returns [`PromptPayError::InvalidAmount`] for negative, NaN, or
    /// infinite values.
    #[inline]
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0_f64 {
            return Err(PromptPayError::InvalidAmount(format!(
                "{value} is not a finite non-negative number"
            )));
        }
        // abs() folds -0.0 into 0.0 so it never formats as "-0.00".
        Ok(Self(value.abs()))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns the value with exactly two decimal places.
    ///
    /// Rounds to the nearest cent using the exact binary value, so `1.005`
    /// (stored just below the tie) gives `"1.00"`. Exact ties such as
    /// `0.125` round away from zero to `"0.13"`, matching JavaScript's
    /// `toFixed(2)`.
    #[inline]
    #[must_use]
    pub fn formatted(self) -> String {
        if is_cent_tie(self.0) {
            format!("{:.2}", (self.0 * 100.0).ceil() / 100.0)
        } else {
            format!("{:.2}", self.0)
        }
    }
}

/// Returns `true` when `value` lies exactly halfway between two cents.
///
/// Only fractions with an eighths remainder of 1, 3, 5 or 7 are
/// representable ties, so the check stays exact in binary.
fn is_cent_tie(value: f64) -> bool {
    (value * 8.0).fract() == 0.0 && (value * 4.0).fract() != 0.0
}

impl fmt::Display for MonetaryAmount {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl TryFrom<f64> for MonetaryAmount {
    type Error = PromptPayError;

    #[inline]
    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl FromStr for MonetaryAmount {
    type Err = PromptPayError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|err| PromptPayError::InvalidAmount(format!("{s:?}: {err}")))?;
        Self::new(value)
    }
}
