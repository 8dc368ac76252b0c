//! # Money Module
//!
//! Provides the `Money` and `Rate` types used by the billing engine.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    336 × 0.08 = 26.880000000000003  ❌ WRONG!                           │
//! │                                                                         │
//! │  Integer cents fix addition, but markup/supplies/tax are FRACTIONAL     │
//! │  rates: $12.34 × 8.75% = $1.07975. Rounding that to cents at every    │
//! │  step makes the total depend on how often it was recomputed.           │
//! │                                                                         │
//! │  OUR SOLUTION: exact base-10 decimals (rust_decimal, 28 digits)        │
//! │    336 × 0.08 = 26.88 exactly                                           │
//! │    Rounding happens ONCE, at the display boundary                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use torque_core::money::{Money, Rate};
//!
//! let part = Money::from_cents(10_000);          // $100.00
//! let markup = part.apply_rate(Rate::from_bps(1000)); // 10%
//! assert_eq!(markup, Money::from_cents(1_000));
//!
//! let tax = Money::from_cents(1234).apply_rate(Rate::from_bps(875));
//! assert_eq!(tax.amount(), Decimal::new(1079750, 6)); // not rounded
//! assert_eq!(tax.round_for_display(), Money::from_cents(108));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

/// Number of decimal places shown to customers.
pub const DISPLAY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in major currency units (dollars), held exactly.
///
/// ## Design Decisions
/// - **Decimal, not f64**: markup and tax are fractional; floats drift
/// - **No implicit rounding**: intermediate totals keep full precision
/// - **Saturating arithmetic**: billing math never panics, even on absurd input
///
/// ## Where Money Flows
/// ```text
/// Part.cost × quantity ──┐
///                        ├──► subtotal ──► shop supplies ──► tax ──► total
/// Labor hours × rate ────┘                                            │
///                                                                      ▼
///                                                  round_for_display() → "$362.88"
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(#[ts(as = "String")] Decimal);

impl Money {
    /// Wraps a decimal amount in major units.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use torque_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, DISPLAY_SCALE))
    }

    /// Creates a Money value from whole dollars.
    #[inline]
    pub fn from_dollars(dollars: i64) -> Self {
        Money(Decimal::from(dollars))
    }

    /// Returns the exact underlying amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a fractional rate (markup, shop supplies, tax).
    ///
    /// The product is exact; nothing is rounded here.
    #[inline]
    pub fn apply_rate(&self, rate: Rate) -> Money {
        Money(self.0.saturating_mul(rate.value()))
    }

    /// Multiplies by a quantity or an hour count.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use torque_core::money::Money;
    ///
    /// let hourly = Money::from_dollars(140);
    /// let labor = hourly.multiply_quantity(Decimal::new(15, 1)); // 1.5 h
    /// assert_eq!(labor, Money::from_dollars(210));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, quantity: Decimal) -> Money {
        Money(self.0.saturating_mul(quantity))
    }

    /// Rounds to cents for display or printing, half away from zero.
    ///
    /// ## Note
    /// Only call this at the presentation boundary. Feeding a rounded value
    /// back into the billing engine loses the exactness guarantee.
    pub fn round_for_display(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the display-rounded amount, e.g. `$10.99` or `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_for_display().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let mut abs = rounded.abs();
        abs.rescale(DISPLAY_SCALE);
        write!(f, "{}${}", sign, abs)
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A fractional rate: `0.35` is 35%.
///
/// Used for parts markup, shop supplies and sales tax. Basis-point
/// constructors exist for constants; stored values are arbitrary decimals
/// so a configured `0.0875` is applied exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Rate(#[ts(as = "String")] Decimal);

impl Rate {
    /// Wraps a fractional rate.
    #[inline]
    pub const fn new(fraction: Decimal) -> Self {
        Rate(fraction)
    }

    /// Creates a rate from basis points (875 bps = 8.75% = 0.0875).
    #[inline]
    pub fn from_bps(bps: u32) -> Self {
        Rate(Decimal::new(i64::from(bps), 4))
    }

    /// Returns the fraction (0.0875 for 8.75%).
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (8.75 for 0.0875).
    pub fn percentage(&self) -> Decimal {
        self.0.saturating_mul(Decimal::ONE_HUNDRED).normalize()
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Lenient Parsing
// =============================================================================

/// Boundary parsing for numeric fields coming from forms and older records.
///
/// Estimate records routinely arrive with prices as strings (`"12.50"`),
/// blanks, or `null`. Every numeric wire field goes through here: anything
/// that is not a finite decimal becomes `None`, and the owning type decides
/// the default. Billing code never sees a parse failure.
pub mod lenient {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    /// Extracts a decimal from a loosely typed JSON value.
    pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
        match value {
            Value::Number(n) => parse_decimal(&n.to_string()),
            Value::String(s) => parse_decimal(s),
            _ => None,
        }
    }

    /// Parses plain (`12.50`) and scientific (`1e-7`) notation.
    pub fn parse_decimal(raw: &str) -> Option<Decimal> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .ok()
    }

    /// `deserialize_with` adapter for `Option<Decimal>` fields.
    pub fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(decimal_from_value(&value))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_from_cents_and_dollars() {
        assert_eq!(Money::from_cents(1099).amount(), dec!(10.99));
        assert_eq!(Money::from_dollars(140).amount(), dec!(140));
        assert_eq!(Money::from_cents(500), Money::from_dollars(5));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_dollars(5).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
        assert_eq!(Money::new(dec!(-0.001)).to_string(), "$0.00");
    }

    #[test]
    fn test_apply_rate_is_exact() {
        let taxable = Money::new(dec!(12.34));
        let tax = taxable.apply_rate(Rate::new(dec!(0.0875)));
        assert_eq!(tax.amount(), dec!(1.079750));
    }

    #[test]
    fn test_round_for_display_half_away_from_zero() {
        assert_eq!(Money::new(dec!(1.005)).round_for_display().amount(), dec!(1.01));
        assert_eq!(Money::new(dec!(1.004)).round_for_display().amount(), dec!(1.00));
        assert_eq!(Money::new(dec!(-1.005)).round_for_display().amount(), dec!(-1.01));
    }

    #[test]
    fn test_float_trap_is_avoided() {
        // 336 * 0.08 in f64 is 26.880000000000003
        let tax = Money::from_dollars(336).apply_rate(Rate::from_bps(800));
        assert_eq!(tax.amount(), dec!(26.88));
    }

    #[test]
    fn test_sum_and_arithmetic() {
        let items = vec![Money::from_cents(150), Money::from_cents(250), Money::zero()];
        let total: Money = items.into_iter().sum();
        assert_eq!(total, Money::from_cents(400));
        assert_eq!(total - Money::from_cents(100), Money::from_cents(300));

        let mut running = Money::zero();
        running += Money::from_cents(5);
        assert_eq!(running, Money::from_cents(5));
    }

    #[test]
    fn test_saturating_never_panics() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!((huge + huge).amount(), Decimal::MAX);
        assert_eq!(huge.apply_rate(Rate::new(dec!(10))).amount(), Decimal::MAX);
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_bps(875);
        assert_eq!(rate.value(), dec!(0.0875));
        assert_eq!(rate.percentage(), dec!(8.75));
        assert_eq!(rate.to_string(), "8.75%");
        assert!(Rate::zero().is_zero());
    }

    #[test]
    fn test_lenient_decimal_from_value() {
        use lenient::decimal_from_value;

        assert_eq!(decimal_from_value(&json!(12.5)), Some(dec!(12.5)));
        assert_eq!(decimal_from_value(&json!(3)), Some(dec!(3)));
        assert_eq!(decimal_from_value(&json!("  19.99 ")), Some(dec!(19.99)));
        assert_eq!(decimal_from_value(&json!("1e-2")), Some(dec!(0.01)));
        assert_eq!(decimal_from_value(&json!("")), None);
        assert_eq!(decimal_from_value(&json!("abc")), None);
        assert_eq!(decimal_from_value(&json!(null)), None);
        assert_eq!(decimal_from_value(&json!(true)), None);
        assert_eq!(decimal_from_value(&json!({"cost": 1})), None);
    }

    #[test]
    fn test_money_serializes_as_string() {
        let json = serde_json::to_string(&Money::new(dec!(362.88))).unwrap();
        assert_eq!(json, "\"362.88\"");

        let parsed: Money = serde_json::from_str("\"10.50\"").unwrap();
        assert_eq!(parsed, Money::new(dec!(10.5)));
    }
}
