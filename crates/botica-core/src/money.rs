//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Céntimos                                     │
//! │    S/ 15.00 is stored as 1500                                       │
//! │    IGV = (1500 × 1800 + 5000) / 10000 = 270 exactly                 │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use botica_core::money::Money;
//!
//! // Create from céntimos (preferred)
//! let price = Money::from_cents(500); // S/ 5.00
//!
//! // Arithmetic operations
//! let line_total = price * 3i64;      // S/ 15.00
//! let igv = line_total.igv();         // S/ 2.70
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::IGV_RATE_BPS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in céntimos (hundredths of a sol).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// Every monetary value in the system (unit prices, line totals, order
/// subtotal/tax/total, payment amounts) flows through this type. The
/// database stores céntimos as plain INTEGER columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from céntimos.
    ///
    /// ## Example
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // S/ 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in céntimos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-sol portion.
    ///
    /// ## Example
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).soles(), 10);
    /// ```
    #[inline]
    pub const fn soles(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the céntimo portion (always 0-99).
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax at an arbitrary rate given in basis points.
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount × bps + 5000) / 10000`.
    /// i128 intermediate prevents overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(1500);
    /// assert_eq!(subtotal.tax(1800).cents(), 270); // 18% of S/ 15.00
    /// ```
    pub fn tax(&self, rate_bps: u32) -> Money {
        let tax_cents = (self.0 as i128 * rate_bps as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Calculates IGV at the fixed 18% rate.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart subtotal: S/ 15.00
    ///      │
    ///      ▼
    /// igv() ← THIS FUNCTION
    ///      │
    ///      ▼
    /// IGV: S/ 2.70  →  Grand total: S/ 17.70
    /// ```
    #[inline]
    pub fn igv(&self) -> Money {
        self.tax(IGV_RATE_BPS)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use botica_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(500); // S/ 5.00
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 1500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in the local format.
///
/// ## Note
/// This is for logs and debugging. A presentation layer should do its own
/// localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}S/ {}.{:02}", sign, self.soles().abs(), self.cents_part())
    }
}

/// Default money is zero.
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

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Mul<i32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i32) -> Self {
        Money(self.0 * qty as i64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
