//! # Validation Module
//!
//! Business rules for shop settings updates.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Settings Update Flow                               │
//! │                                                                         │
//! │  Settings form ──► SettingsUpdate (partial, lenient numbers)           │
//! │                          │                                              │
//! │                          ▼                                              │
//! │               validate_update() ← THIS MODULE                          │
//! │                          │                                              │
//! │          ┌───────────────┴───────────────┐                             │
//! │          ▼                               ▼                              │
//! │   Err(ValidationError)          ShopSettings::apply_update             │
//! │   settings untouched            merged copy sent to the server         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Billing itself never validates; it only ever reads settings that
//! already passed through here or through the defaulting boundary.

use rust_decimal::Decimal;

use crate::error::{ValidationError, ValidationResult};
use crate::money::{Money, Rate};
use crate::types::{SettingsUpdate, ShopSettings};
use crate::{MAX_LABOR_RATE_DOLLARS, MAX_MARKUP_BPS, MAX_PERCENT_RATE_BPS};

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a fractional rate against an upper bound in basis points.
///
/// ## Example
/// ```rust
/// use torque_core::money::Rate;
/// use torque_core::validation::validate_rate;
///
/// assert!(validate_rate("taxRate", Rate::from_bps(875), 10_000).is_ok());
/// assert!(validate_rate("taxRate", Rate::from_bps(10_001), 10_000).is_err());
/// ```
pub fn validate_rate(field: &str, rate: Rate, max_bps: u32) -> ValidationResult<()> {
    let max = Rate::from_bps(max_bps).value();
    check_range(field, rate.value(), max)
}

/// Validates a money amount against an upper bound in whole dollars.
pub fn validate_amount(field: &str, amount: Money, max_dollars: i64) -> ValidationResult<()> {
    check_range(field, amount.amount(), Decimal::from(max_dollars))
}

fn check_range(field: &str, value: Decimal, max: Decimal) -> ValidationResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: Decimal::ZERO,
            max: max.normalize(),
        });
    }

    Ok(())
}

// =============================================================================
// Update Validator
// =============================================================================

/// Validates every field present in a settings update.
///
/// ## Rules
/// - At least one field must be set
/// - `taxRate`, `shopSuppliesRate`: 0 to 1 (0% to 100%)
/// - `partsMarkup`: 0 to 10 (0% to 1000%)
/// - `laborRate`, `diagnosticFee`: 0 to 10 000
pub fn validate_update(update: &SettingsUpdate) -> ValidationResult<()> {
    if update.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }

    if let Some(rate) = update.tax_rate {
        validate_rate("taxRate", rate, MAX_PERCENT_RATE_BPS)?;
    }
    if let Some(rate) = update.shop_supplies_rate {
        validate_rate("shopSuppliesRate", rate, MAX_PERCENT_RATE_BPS)?;
    }
    if let Some(rate) = update.parts_markup {
        validate_rate("partsMarkup", rate, MAX_MARKUP_BPS)?;
    }
    if let Some(amount) = update.labor_rate {
        validate_amount("laborRate", amount, MAX_LABOR_RATE_DOLLARS)?;
    }
    if let Some(amount) = update.diagnostic_fee {
        validate_amount("diagnosticFee", amount, MAX_LABOR_RATE_DOLLARS)?;
    }

    Ok(())
}

/// Validates a complete settings record against the same bounds as
/// [`validate_update`], e.g. a pricing fallback read from a config file.
pub fn validate_settings(settings: &ShopSettings) -> ValidationResult<()> {
    validate_rate("taxRate", settings.tax_rate, MAX_PERCENT_RATE_BPS)?;
    validate_rate("shopSuppliesRate", settings.shop_supplies_rate, MAX_PERCENT_RATE_BPS)?;
    validate_rate("partsMarkup", settings.parts_markup, MAX_MARKUP_BPS)?;
    validate_amount("laborRate", settings.labor_rate, MAX_LABOR_RATE_DOLLARS)?;
    validate_amount("diagnosticFee", settings.diagnostic_fee, MAX_LABOR_RATE_DOLLARS)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_rate_bounds() {
        assert!(validate_rate("taxRate", Rate::zero(), 10_000).is_ok());
        assert!(validate_rate("taxRate", Rate::new(dec!(1)), 10_000).is_ok());
        assert_eq!(
            validate_rate("taxRate", Rate::new(dec!(-0.01)), 10_000),
            Err(ValidationError::Negative {
                field: "taxRate".to_string()
            })
        );
        assert!(matches!(
            validate_rate("taxRate", Rate::new(dec!(1.0001)), 10_000),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_amount_bounds() {
        assert!(validate_amount("laborRate", Money::from_dollars(140), 10_000).is_ok());
        assert!(validate_amount("laborRate", Money::from_cents(-1), 10_000).is_err());
        assert!(validate_amount("laborRate", Money::from_dollars(10_001), 10_000).is_err());
    }

    #[test]
    fn test_validate_update() {
        assert_eq!(
            validate_update(&SettingsUpdate::default()),
            Err(ValidationError::EmptyUpdate)
        );

        let ok = SettingsUpdate {
            parts_markup: Some(Rate::new(dec!(2.5))),
            ..Default::default()
        };
        assert!(validate_update(&ok).is_ok());

        let bad = SettingsUpdate {
            labor_rate: Some(Money::from_dollars(150)),
            shop_supplies_rate: Some(Rate::new(dec!(1.5))),
            ..Default::default()
        };
        let err = validate_update(&bad).unwrap_err();
        assert_eq!(err.to_string(), "shopSuppliesRate must be between 0 and 1");
    }

    #[test]
    fn test_validate_settings() {
        assert!(validate_settings(&ShopSettings::default()).is_ok());

        let zero_tax = ShopSettings {
            tax_rate: Rate::zero(),
            ..Default::default()
        };
        assert!(validate_settings(&zero_tax).is_ok());

        let percent_markup = ShopSettings {
            parts_markup: Rate::new(dec!(35)),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&percent_markup),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
