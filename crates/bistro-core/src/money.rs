//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Option prices are added unit by unit, so drift accumulates quickly:    │
//! │    10 × €0.10 extra cheese = €0.9999999999999999                       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10 × 10 cents = 100 cents, exactly                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bistro_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099); // €10.99
//!
//! // Catalog decimals are parsed from text, never through f64
//! let extra = Money::parse_decimal("1.5").unwrap();
//! assert_eq!(extra.cents(), 150);
//!
//! let total = price + extra * 2;
//! assert_eq!(total.cents(), 1399);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in euro cents.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  MenuOption.unit_price ──► SelectedOption.unit_price (frozen copy)      │
/// │                                   │                                     │
/// │  MenuItem.price ──────────────────┼──► PriceQuote.single_item_price     │
/// │                                   │          │                          │
/// │                                   ▼          ▼                          │
/// │                          ConfiguredLineItem.original_price              │
/// │                                   │                                     │
/// │                          coupon ──┴──► discounted_price ──► OrderDraft  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents €10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from euros and cents.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// let price = Money::from_major_minor(10, 99); // €10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a non-negative decimal amount in euros.
    ///
    /// Accepts `"12"`, `"1.5"`, `"0.45"`, `".5"`. Digits past the cent are
    /// rounded half-up. Returns `None` for negative, malformed or overflowing
    /// input so callers can decide on a fallback.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("2.495").unwrap().cents(), 250);
    /// assert!(Money::parse_decimal("-1").is_none());
    /// assert!(Money::parse_decimal("abc").is_none());
    /// ```
    pub fn parse_decimal(text: &str) -> Option<Money> {
        parse_fixed_point(text, 2).map(Money)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole euro portion.
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cent portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }

    /// Applies a percentage discount and returns the discounted amount.
    ///
    /// The discount amount is rounded half-up to the cent, once.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::Money;
    /// use bistro_core::types::DiscountRate;
    ///
    /// let unit = Money::from_cents(800); // €8.00
    /// let discounted = unit.apply_discount(DiscountRate::from_bps(2000)); // 20% off
    /// assert_eq!(discounted.cents(), 640); // €6.40
    /// ```
    pub fn apply_discount(&self, rate: DiscountRate) -> Money {
        Money(self.0.saturating_sub(self.discount_amount(rate).0))
    }

    /// Returns the amount a discount takes off this value.
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        let amount = (i128::from(self.0) * i128::from(rate.bps()) + 5000) / 10000;
        Money(amount as i64)
    }
}

// =============================================================================
// Fixed-Point Parsing
// =============================================================================

/// Parses a non-negative decimal string into an integer scaled by
/// `10^decimals`, rounding half-up on the first dropped digit.
///
/// Shared by [`Money::parse_decimal`] (2 decimals) and the discount rate
/// parsers (basis points). Never goes through `f64`.
pub(crate) fn parse_fixed_point(text: &str, decimals: u32) -> Option<i64> {
    let text = text.trim();
    let text = text.strip_prefix('+').unwrap_or(text);

    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut value: i64 = 0;
    for digit in whole.bytes().map(|b| i64::from(b - b'0')) {
        value = value.checked_mul(10)?.checked_add(digit)?;
    }

    let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
    for _ in 0..decimals {
        let digit = fraction_digits.next().unwrap_or(0);
        value = value.checked_mul(10)?.checked_add(digit)?;
    }

    if fraction_digits.next().unwrap_or(0) >= 5 {
        value = value.checked_add(1)?;
    }

    Some(value)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display renders euros with two decimals.
///
/// ## Note
/// This is the single place where amounts are formatted for humans.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}€{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

/// Multiplication by a quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.euros(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "€10.99");
        assert_eq!(format!("{}", Money::from_cents(640)), "€6.40");
        assert_eq!(format!("{}", Money::from_cents(0)), "€0.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-€5.50");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(Money::parse_decimal("12"), Some(Money::from_cents(1200)));
        assert_eq!(Money::parse_decimal("1.5"), Some(Money::from_cents(150)));
        assert_eq!(Money::parse_decimal("0.45"), Some(Money::from_cents(45)));
        assert_eq!(Money::parse_decimal(".5"), Some(Money::from_cents(50)));
        assert_eq!(Money::parse_decimal(" 3.10 "), Some(Money::from_cents(310)));
        assert_eq!(Money::parse_decimal("0.494"), Some(Money::from_cents(49)));
        assert_eq!(Money::parse_decimal("0.495"), Some(Money::from_cents(50)));
        assert_eq!(Money::parse_decimal("9.999"), Some(Money::from_cents(1000)));
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert_eq!(Money::parse_decimal(""), None);
        assert_eq!(Money::parse_decimal("."), None);
        assert_eq!(Money::parse_decimal("-2.00"), None);
        assert_eq!(Money::parse_decimal("1e3"), None);
        assert_eq!(Money::parse_decimal("1.2.3"), None);
        assert_eq!(Money::parse_decimal("99999999999999999999"), None);
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_wrapping() {
        let huge = Money::from_cents(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(999).cents(), i64::MAX);
        assert_eq!((huge * 3).cents(), i64::MAX);
        assert_eq!((huge + huge + huge).cents(), i64::MAX);

        let mut total = huge;
        total += huge;
        total += huge;
        assert_eq!(total.cents(), i64::MAX);

        let summed: Money = [huge, huge, huge].iter().sum();
        assert_eq!(summed.cents(), i64::MAX);
        assert!(summed.is_positive());

        assert_eq!((Money::from_cents(i64::MIN) - huge).cents(), i64::MIN);
    }

    #[test]
    fn test_parse_fixed_point_scales() {
        assert_eq!(parse_fixed_point("12.5", 2), Some(1250));
        assert_eq!(parse_fixed_point("0.125", 4), Some(1250));
        assert_eq!(parse_fixed_point("0.12345", 4), Some(1235));
        assert_eq!(parse_fixed_point("7", 0), Some(7));
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = [a, b, b].iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_discount() {
        let unit = Money::from_cents(800);
        assert_eq!(unit.apply_discount(DiscountRate::from_bps(2000)).cents(), 640);
        assert_eq!(unit.apply_discount(DiscountRate::zero()), unit);

        // 12.5% of €9.99 = 124.875 cents → 125
        let unit = Money::from_cents(999);
        assert_eq!(unit.discount_amount(DiscountRate::from_bps(1250)).cents(), 125);
        assert_eq!(unit.apply_discount(DiscountRate::from_bps(1250)).cents(), 874);
    }
}
