//! # Money Module
//!
//! Provides the `Money` type for handling monetary values exactly.
//!
//! ## Why Not Floating Point?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Exact Decimal                                            │
//! │    "0.10" + "0.20" = "0.30"                                             │
//! │    Parsed from strings, stored as strings, computed in base 10         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire and Storage Format
//! Money always travels as a decimal *string* with exactly two fractional
//! digits (`"19.99"`, `"5.00"`). JSON numbers are rejected on input so a
//! client can never smuggle a float through.
//!
//! ## Usage
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::parse("19.99").unwrap();
//! let total = price + Money::parse("0.01").unwrap();
//! assert_eq!(total.to_string(), "20.00");
//!
//! // NEVER do this:
//! // let bad = Money::from_f64(19.99); // NO SUCH METHOD EXISTS!
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::CoreError;
use crate::PRICE_SCALE;

/// Largest number of integer digits a price may carry.
///
/// Keeps every value far enough from `Decimal::MAX` that rescaling to
/// [`PRICE_SCALE`] digits is always exact.
pub const MAX_INTEGER_DIGITS: usize = 15;

// =============================================================================
// Money Type
// =============================================================================

/// An exact monetary amount with at most [`PRICE_SCALE`] fractional digits.
///
/// ## Design Decisions
/// - **rust_decimal**: base-10 arithmetic, no rounding drift
/// - **String serde**: `"19.99"` in and out, numbers rejected
/// - **Signed**: arithmetic may go negative; price validation rejects it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

impl Money {
    /// Parses a decimal string such as `"19.99"`, `"5"` or `"0.5"`.
    ///
    /// ## Rules
    /// - Only ASCII digits, one optional leading `-`, one optional `.`
    /// - No exponent notation, separators or currency symbols
    /// - At most [`PRICE_SCALE`] significant fractional digits
    ///   (`"1.50"` and `"1.500"` are fine, `"1.005"` is not)
    /// - At most [`MAX_INTEGER_DIGITS`] integer digits, ignoring leading zeros
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::parse("5").unwrap().to_string(), "5.00");
    /// assert!(Money::parse("1.005").is_err());
    /// assert!(Money::parse("1e3").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let raw = input.trim();
        let invalid = |reason: &str| CoreError::InvalidMoney {
            value: input.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("amount is empty"));
        }

        let digits = raw.strip_prefix('-').unwrap_or(raw);
        if !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
            || digits.matches('.').count() > 1
            || !digits.chars().any(|c| c.is_ascii_digit())
        {
            return Err(invalid("expected a plain decimal number like 19.99"));
        }

        // Checked on the text: Decimal::from_str rounds past 28 fractional digits
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if fraction.trim_end_matches('0').len() > PRICE_SCALE as usize {
            return Err(invalid(&format!(
                "at most {} decimal places are allowed",
                PRICE_SCALE
            )));
        }
        if integer.trim_start_matches('0').len() > MAX_INTEGER_DIGITS {
            return Err(invalid(&format!(
                "at most {} integer digits are allowed",
                MAX_INTEGER_DIGITS
            )));
        }

        let value = Decimal::from_str(raw).map_err(|e| invalid(&e.to_string()))?;
        let value = value.normalize();

        Ok(Money(value))
    }

    /// Creates a Money value from minor units (cents).
    ///
    /// ## Example
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1999).to_string(), "19.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, PRICE_SCALE))
    }

    /// Returns zero money value.
    #[inline]
    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Canonical text used for the database column and the wire.
    pub fn to_storage_string(&self) -> String {
        self.to_string()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Always renders exactly [`PRICE_SCALE`] fractional digits.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0;
        value.rescale(PRICE_SCALE);
        write!(f, "{}", value)
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl TryFrom<String> for Money {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Money::parse(&value)
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Money::parse("19.99").unwrap().to_string(), "19.99");
        assert_eq!(Money::parse("5").unwrap().to_string(), "5.00");
        assert_eq!(Money::parse("0.5").unwrap().to_string(), "0.50");
        assert_eq!(Money::parse(" 7.10 ").unwrap().to_string(), "7.10");
        assert_eq!(Money::parse("1.500").unwrap().to_string(), "1.50");
        assert_eq!(Money::parse("-3.25").unwrap().to_string(), "-3.25");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in [
            "",
            "   ",
            "abc",
            "1e3",
            "12,50",
            "$5",
            "1.2.3",
            "-",
            ".",
            "1.005",
            "19.990000000000000000000000000009",
            "1.00000000000000000000000000001",
            "0.0000000000000000000000000000001",
        ] {
            assert!(Money::parse(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_no_float_drift() {
        let a = Money::parse("0.1").unwrap();
        let b = Money::parse("0.2").unwrap();
        assert_eq!(a + b, Money::parse("0.3").unwrap());
        assert_eq!((a + b).to_string(), "0.30");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(250);

        assert_eq!((a + b).to_string(), "12.50");
        assert_eq!((b - a).to_string(), "-7.50");
        assert!((b - a).is_negative());
        assert!(Money::zero().is_zero());
        assert!(!Money::parse("-0").unwrap().is_negative());
    }

    #[test]
    fn test_integer_digits_are_bounded() {
        let largest = Money::parse("999999999999999.99").unwrap();
        assert_eq!(largest.to_string(), "999999999999999.99");
        assert_eq!(Money::parse("000000000000000001.50").unwrap().to_string(), "1.50");

        assert!(Money::parse("1000000000000000").is_err());
        assert!(Money::parse("79228162514264337593543950335").is_err());
    }

    #[test]
    fn test_serde_uses_strings() {
        let price: Money = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(price, Money::from_cents(1999));
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"19.99\"");

        // JSON numbers are binary floats on many clients; refuse them.
        assert!(serde_json::from_str::<Money>("19.99").is_err());
        assert!(serde_json::from_str::<Money>("\"1.001\"").is_err());
    }

    #[test]
    fn test_equal_regardless_of_trailing_zeros() {
        assert_eq!(Money::parse("1.5").unwrap(), Money::parse("1.50").unwrap());
        assert_eq!(
            Money::parse("1.5").unwrap().to_storage_string(),
            Money::parse("1.50").unwrap().to_storage_string()
        );
    }
}
