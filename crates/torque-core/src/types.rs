//! # Domain Types
//!
//! Line items, shop settings and the derived totals breakdown.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Part       │   │    LaborLine    │   │  ShopSettings   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  cost  (→ 0)    │   │  hours (→ 0)    │   │  laborRate      │       │
//! │  │  quantity (→ 1) │   │  rate (→ shop)  │   │  partsMarkup    │       │
//! │  └────────┬────────┘   └────────┬────────┘   │  shopSupplies   │       │
//! │           └──────────┬──────────┘            │  taxRate        │       │
//! │                      ▼                       └────────┬────────┘       │
//! │              ┌───────────────┐                        │                 │
//! │              │ BillableItems │ ──── compute_totals ◄──┘                 │
//! │              └───────────────┘            │                             │
//! │                                           ▼                             │
//! │                                  ┌─────────────────┐                    │
//! │                                  │ TotalsBreakdown │  (derived only)   │
//! │                                  └─────────────────┘                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundary Defaults
//! Wire records are loose: prices arrive as strings, blanks or `null`.
//! Numeric fields are `Option<Decimal>` parsed through
//! [`crate::money::lenient`], and the accessor methods apply the defaults.
//! Settings are defaulted once, when deserialized.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationResult;
use crate::money::{lenient, Money, Rate};
use crate::validation;
use crate::{
    DEFAULT_DIAGNOSTIC_FEE_DOLLARS, DEFAULT_LABOR_RATE_DOLLARS, DEFAULT_PARTS_MARKUP_BPS,
    DEFAULT_SHOP_SUPPLIES_BPS, DEFAULT_TAX_RATE_BPS,
};

// =============================================================================
// Part
// =============================================================================

/// A priced component consumed by a job or estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub part_number: Option<String>,

    /// Unit cost. Absent or unparseable counts as 0.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(as = "Option<String>")]
    pub cost: Option<Decimal>,

    /// Units used. Absent, unparseable or zero counts as 1.
    ///
    /// Fractional quantities (fluids by the quart) are kept as-is.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(as = "Option<String>")]
    pub quantity: Option<Decimal>,
}

impl Part {
    /// Creates a part with a cost and a whole quantity.
    pub fn new(cost: Money, quantity: u32) -> Self {
        Part {
            cost: Some(cost.amount()),
            quantity: Some(Decimal::from(quantity)),
            ..Default::default()
        }
    }

    /// Unit cost with the zero default applied.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::new(self.cost.unwrap_or(Decimal::ZERO))
    }

    /// Quantity with the one-unit default applied.
    #[inline]
    pub fn effective_quantity(&self) -> Decimal {
        match self.quantity {
            Some(qty) if !qty.is_zero() => qty,
            _ => Decimal::ONE,
        }
    }

    /// `unit_cost × effective_quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_cost().multiply_quantity(self.effective_quantity())
    }
}

// =============================================================================
// Labor Line
// =============================================================================

/// Billable labor on a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LaborLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub description: Option<String>,

    /// Hours worked. Absent or unparseable counts as 0.
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(as = "Option<String>")]
    pub hours: Option<Decimal>,

    /// Hourly rate override. Absent falls back to the shop labor rate;
    /// an explicit 0 is honoured (no-charge labor).
    #[serde(default, deserialize_with = "lenient::decimal")]
    #[ts(as = "Option<String>")]
    pub rate: Option<Decimal>,
}

impl LaborLine {
    /// Labor at the shop's default rate.
    pub fn at_shop_rate(hours: Decimal) -> Self {
        LaborLine {
            hours: Some(hours),
            ..Default::default()
        }
    }

    /// Labor at an explicit hourly rate.
    pub fn at_rate(hours: Decimal, rate: Money) -> Self {
        LaborLine {
            hours: Some(hours),
            rate: Some(rate.amount()),
            ..Default::default()
        }
    }

    #[inline]
    pub fn effective_hours(&self) -> Decimal {
        self.hours.unwrap_or(Decimal::ZERO)
    }

    #[inline]
    pub fn effective_rate(&self, default_rate: Money) -> Money {
        self.rate.map(Money::new).unwrap_or(default_rate)
    }

    /// `hours × (line rate or default rate)`.
    #[inline]
    pub fn line_total(&self, default_rate: Money) -> Money {
        self.effective_rate(default_rate)
            .multiply_quantity(self.effective_hours())
    }
}

// =============================================================================
// Billable Items
// =============================================================================

/// The parts and labor of one estimate or invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillableItems {
    #[serde(default)]
    pub parts: Vec<Part>,

    #[serde(default)]
    pub labor: Vec<LaborLine>,
}

impl BillableItems {
    pub fn new(parts: Vec<Part>, labor: Vec<LaborLine>) -> Self {
        BillableItems { parts, labor }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty() && self.labor.is_empty()
    }
}

// =============================================================================
// Shop Settings
// =============================================================================

/// Pricing configuration for the shop.
///
/// ## Lifecycle
/// ```text
/// Session start ──► GET /api/settings ──► ShopSettings (defaults filled)
///                                              │
///        Billing engine (read-only) ◄──────────┤
///                                              │
/// Settings form ──► SettingsUpdate ──► apply_update() ──► PUT /api/settings
/// ```
///
/// Missing or unparseable fields take the shop defaults during
/// deserialization; an explicit `0` (e.g. a tax-exempt shop) is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", from = "RawShopSettings")]
pub struct ShopSettings {
    /// Default hourly labor rate.
    pub labor_rate: Money,

    /// Markup on parts cost (0.35 = 35%).
    pub parts_markup: Rate,

    /// Shop supplies surcharge on the parts + labor subtotal.
    pub shop_supplies_rate: Rate,

    /// Sales tax on subtotal + shop supplies.
    pub tax_rate: Rate,

    /// Flat diagnostic fee offered when creating jobs. Not part of totals.
    pub diagnostic_fee: Money,
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            labor_rate: Money::from_dollars(DEFAULT_LABOR_RATE_DOLLARS),
            parts_markup: Rate::from_bps(DEFAULT_PARTS_MARKUP_BPS),
            shop_supplies_rate: Rate::from_bps(DEFAULT_SHOP_SUPPLIES_BPS),
            tax_rate: Rate::from_bps(DEFAULT_TAX_RATE_BPS),
            diagnostic_fee: Money::from_dollars(DEFAULT_DIAGNOSTIC_FEE_DOLLARS),
        }
    }
}

impl ShopSettings {
    /// Validates and merges a partial update.
    ///
    /// On error `self` is left untouched.
    ///
    /// ## Example
    /// ```rust
    /// use torque_core::{Rate, SettingsUpdate, ShopSettings};
    ///
    /// let mut settings = ShopSettings::default();
    /// let update = SettingsUpdate {
    ///     tax_rate: Some(Rate::from_bps(700)),
    ///     ..Default::default()
    /// };
    /// settings.apply_update(&update).unwrap();
    /// assert_eq!(settings.tax_rate, Rate::from_bps(700));
    /// ```
    pub fn apply_update(&mut self, update: &SettingsUpdate) -> ValidationResult<()> {
        validation::validate_update(update)?;

        if let Some(rate) = update.labor_rate {
            self.labor_rate = rate;
        }
        if let Some(rate) = update.parts_markup {
            self.parts_markup = rate;
        }
        if let Some(rate) = update.shop_supplies_rate {
            self.shop_supplies_rate = rate;
        }
        if let Some(rate) = update.tax_rate {
            self.tax_rate = rate;
        }
        if let Some(fee) = update.diagnostic_fee {
            self.diagnostic_fee = fee;
        }

        Ok(())
    }

    /// Returns a copy with the update applied, leaving `self` unchanged.
    pub fn with_update(&self, update: &SettingsUpdate) -> ValidationResult<ShopSettings> {
        let mut next = self.clone();
        next.apply_update(update)?;
        Ok(next)
    }
}

/// Loose wire shape of [`ShopSettings`]; every field optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShopSettings {
    #[serde(default, deserialize_with = "lenient::decimal")]
    labor_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    parts_markup: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    shop_supplies_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    tax_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    diagnostic_fee: Option<Decimal>,
}

impl From<RawShopSettings> for ShopSettings {
    fn from(raw: RawShopSettings) -> Self {
        let defaults = ShopSettings::default();
        ShopSettings {
            labor_rate: raw.labor_rate.map(Money::new).unwrap_or(defaults.labor_rate),
            parts_markup: raw.parts_markup.map(Rate::new).unwrap_or(defaults.parts_markup),
            shop_supplies_rate: raw
                .shop_supplies_rate
                .map(Rate::new)
                .unwrap_or(defaults.shop_supplies_rate),
            tax_rate: raw.tax_rate.map(Rate::new).unwrap_or(defaults.tax_rate),
            diagnostic_fee: raw
                .diagnostic_fee
                .map(Money::new)
                .unwrap_or(defaults.diagnostic_fee),
        }
    }
}

// =============================================================================
// Settings Update
// =============================================================================

/// A partial change to [`ShopSettings`]. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub labor_rate: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub parts_markup: Option<Rate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub shop_supplies_rate: Option<Rate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub tax_rate: Option<Rate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub diagnostic_fee: Option<Money>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.labor_rate.is_none()
            && self.parts_markup.is_none()
            && self.shop_supplies_rate.is_none()
            && self.tax_rate.is_none()
            && self.diagnostic_fee.is_none()
    }
}

// =============================================================================
// Totals Breakdown
// =============================================================================

/// Derived cost breakdown of an estimate or invoice.
///
/// Never persisted. Invariant: `total == subtotal + shop_supplies + tax`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TotalsBreakdown {
    pub parts_subtotal: Money,
    pub parts_markup: Money,
    pub parts_total: Money,
    pub labor_subtotal: Money,
    pub subtotal: Money,
    pub shop_supplies: Money,
    pub taxable: Money,
    pub tax: Money,
    pub total: Money,
}

impl TotalsBreakdown {
    /// Rounds every field to cents for display or printing.
    ///
    /// Fields are rounded independently, so on the rounded copy the
    /// `total` identity may be off by a cent. Recompute from the exact
    /// breakdown rather than summing rounded fields.
    pub fn rounded_for_display(&self) -> TotalsBreakdown {
        TotalsBreakdown {
            parts_subtotal: self.parts_subtotal.round_for_display(),
            parts_markup: self.parts_markup.round_for_display(),
            parts_total: self.parts_total.round_for_display(),
            labor_subtotal: self.labor_subtotal.round_for_display(),
            subtotal: self.subtotal.round_for_display(),
            shop_supplies: self.shop_supplies.round_for_display(),
            taxable: self.taxable.round_for_display(),
            tax: self.tax.round_for_display(),
            total: self.total.round_for_display(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
