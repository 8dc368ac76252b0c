//! # Billing Engine
//!
//! Deterministic computation of an estimate or invoice total.
//!
//! ## Order of Application
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     compute_totals() pipeline                           │
//! │                                                                         │
//! │  1. parts_subtotal  = Σ cost × quantity                                │
//! │     parts_markup    = parts_subtotal × partsMarkup                     │
//! │     parts_total     = parts_subtotal + parts_markup                    │
//! │                                                                         │
//! │  2. labor_subtotal  = Σ hours × (line rate or laborRate)               │
//! │                                                                         │
//! │  3. subtotal        = parts_total + labor_subtotal                     │
//! │  4. shop_supplies   = subtotal × shopSuppliesRate                      │
//! │  5. taxable         = subtotal + shop_supplies                         │
//! │  6. tax             = taxable × taxRate                                │
//! │  7. total           = taxable + tax                                    │
//! │                                                                         │
//! │  Markup applies to parts only. Shop supplies are taxed.                │
//! │  Reordering any step changes the customer's total.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is total: no `Result`, no panics, no rounding.

use crate::money::{Money, Rate};
use crate::types::{BillableItems, LaborLine, Part, ShopSettings, TotalsBreakdown};

/// Sum of `cost × quantity` over all parts.
///
/// Missing cost counts as 0 and missing quantity as 1.
///
/// ## Example
/// ```rust
/// use torque_core::{billing, Money, Part};
///
/// let parts = vec![Part::new(Money::from_dollars(100), 2), Part::default()];
/// assert_eq!(billing::parts_subtotal(&parts), Money::from_dollars(200));
/// ```
pub fn parts_subtotal(parts: &[Part]) -> Money {
    parts.iter().map(Part::line_total).sum()
}

/// `parts_subtotal × markup_rate`.
#[inline]
pub fn parts_markup(parts_subtotal: Money, markup_rate: Rate) -> Money {
    parts_subtotal.apply_rate(markup_rate)
}

/// Sum of `hours × rate` over all labor lines, with `default_rate` for
/// lines that carry no rate of their own.
pub fn labor_subtotal(labor: &[LaborLine], default_rate: Money) -> Money {
    labor.iter().map(|line| line.line_total(default_rate)).sum()
}

/// `subtotal × supplies_rate`.
#[inline]
pub fn shop_supplies(subtotal: Money, supplies_rate: Rate) -> Money {
    subtotal.apply_rate(supplies_rate)
}

/// `taxable × tax_rate`.
#[inline]
pub fn tax(taxable: Money, tax_rate: Rate) -> Money {
    taxable.apply_rate(tax_rate)
}

/// Computes the full breakdown for an estimate or invoice.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use torque_core::{billing, BillableItems, LaborLine, Money, Part, Rate, ShopSettings};
///
/// let items = BillableItems::new(
///     vec![Part::new(Money::from_dollars(100), 2)],
///     vec![LaborLine::at_rate(Decimal::from(2), Money::from_dollars(50))],
/// );
/// let settings = ShopSettings {
///     labor_rate: Money::zero(),
///     parts_markup: Rate::from_bps(1000),
///     shop_supplies_rate: Rate::from_bps(500),
///     tax_rate: Rate::from_bps(800),
///     ..Default::default()
/// };
///
/// let totals = billing::compute_totals(&items, &settings);
/// assert_eq!(totals.total, Money::from_cents(36288));
/// ```
pub fn compute_totals(items: &BillableItems, settings: &ShopSettings) -> TotalsBreakdown {
    let parts_subtotal = parts_subtotal(&items.parts);
    let parts_markup = parts_markup(parts_subtotal, settings.parts_markup);
    let parts_total = parts_subtotal + parts_markup;

    let labor_subtotal = labor_subtotal(&items.labor, settings.labor_rate);
    let subtotal = parts_total + labor_subtotal;

    let shop_supplies = shop_supplies(subtotal, settings.shop_supplies_rate);
    let taxable = subtotal + shop_supplies;
    let tax = tax(taxable, settings.tax_rate);
    let total = taxable + tax;

    TotalsBreakdown {
        parts_subtotal,
        parts_markup,
        parts_total,
        labor_subtotal,
        subtotal,
        shop_supplies,
        taxable,
        tax,
        total,
    }
}

impl BillableItems {
    /// Shorthand for [`compute_totals`].
    pub fn totals(&self, settings: &ShopSettings) -> TotalsBreakdown {
        compute_totals(self, settings)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn settings(labor: Decimal, markup: Decimal, supplies: Decimal, tax: Decimal) -> ShopSettings {
        ShopSettings {
            labor_rate: Money::new(labor),
            parts_markup: Rate::new(markup),
            shop_supplies_rate: Rate::new(supplies),
            tax_rate: Rate::new(tax),
            ..Default::default()
        }
    }

    fn reference_job() -> BillableItems {
        BillableItems::new(
            vec![Part::new(Money::from_dollars(100), 2)],
            vec![LaborLine::at_rate(dec!(2), Money::from_dollars(50))],
        )
    }

    #[test]
    fn test_reference_scenario() {
        let totals = compute_totals(
            &reference_job(),
            &settings(dec!(0), dec!(0.1), dec!(0.05), dec!(0.08)),
        );

        assert_eq!(totals.parts_subtotal.amount(), dec!(200));
        assert_eq!(totals.parts_markup.amount(), dec!(20));
        assert_eq!(totals.parts_total.amount(), dec!(220));
        assert_eq!(totals.labor_subtotal.amount(), dec!(100));
        assert_eq!(totals.subtotal.amount(), dec!(320));
        assert_eq!(totals.shop_supplies.amount(), dec!(16));
        assert_eq!(totals.taxable.amount(), dec!(336));
        assert_eq!(totals.tax.amount(), dec!(26.88));
        assert_eq!(totals.total.amount(), dec!(362.88));
    }

    #[test]
    fn test_empty_items_are_all_zero() {
        let totals = compute_totals(&BillableItems::default(), &ShopSettings::default());
        assert_eq!(totals, TotalsBreakdown::default());
        assert!(totals.total.is_zero());
    }

    #[test]
    fn test_parts_subtotal_defaults() {
        let parts: Vec<Part> = serde_json::from_value(json!([
            { "cost": 10, "quantity": 3 },
            { "cost": "4.25" },
            { "quantity": 7 },
            {}
        ]))
        .unwrap();
        assert_eq!(parts_subtotal(&parts).amount(), dec!(34.25));
    }

    #[test]
    fn test_labor_subtotal_mixes_default_and_override() {
        let labor = vec![
            LaborLine::at_shop_rate(dec!(1.5)),
            LaborLine::at_rate(dec!(0.5), Money::from_dollars(200)),
        ];
        let subtotal = labor_subtotal(&labor, Money::from_dollars(140));
        assert_eq!(subtotal, Money::from_dollars(310));
    }

    #[test]
    fn test_zero_markup_keeps_parts_total() {
        let totals = compute_totals(
            &reference_job(),
            &settings(dec!(140), dec!(0), dec!(0.05), dec!(0.0875)),
        );
        assert_eq!(totals.parts_total, totals.parts_subtotal);
        assert!(totals.parts_markup.is_zero());
    }

    #[test]
    fn test_total_identity_holds_exactly() {
        let jobs = [
            reference_job(),
            BillableItems::new(
                vec![
                    Part::new(Money::new(dec!(12.34)), 3),
                    Part::new(Money::new(dec!(0.99)), 17),
                ],
                vec![LaborLine::at_shop_rate(dec!(1.3))],
            ),
            BillableItems::new(vec![], vec![LaborLine::at_shop_rate(dec!(0.1))]),
        ];
        let configs = [
            ShopSettings::default(),
            settings(dec!(137.5), dec!(0.333), dec!(0.0425), dec!(0.0925)),
            settings(dec!(0), dec!(0), dec!(0), dec!(0)),
        ];

        for job in &jobs {
            for config in &configs {
                let t = compute_totals(job, config);
                assert_eq!(t.total, t.subtotal + t.shop_supplies + t.tax);
                assert_eq!(t.taxable, t.subtotal + t.shop_supplies);
                assert_eq!(t.subtotal, t.parts_total + t.labor_subtotal);
                assert!(!t.total.is_negative());
            }
        }
    }

    #[test]
    fn test_compute_totals_is_idempotent() {
        let job = reference_job();
        let config = ShopSettings::default();
        assert_eq!(compute_totals(&job, &config), compute_totals(&job, &config));
        assert_eq!(job.totals(&config), compute_totals(&job, &config));
    }

    #[test]
    fn test_supplies_are_taxed() {
        // 100 subtotal, 10% supplies, 10% tax: tax is on 110, not 100
        let job = BillableItems::new(vec![], vec![LaborLine::at_shop_rate(dec!(1))]);
        let totals = compute_totals(&job, &settings(dec!(100), dec!(0), dec!(0.1), dec!(0.1)));
        assert_eq!(totals.tax.amount(), dec!(11));
        assert_eq!(totals.total.amount(), dec!(121));
    }

    #[test]
    fn test_no_internal_rounding() {
        let job = BillableItems::new(vec![Part::new(Money::new(dec!(12.34)), 1)], vec![]);
        let totals = compute_totals(&job, &settings(dec!(0), dec!(0), dec!(0), dec!(0.0875)));
        assert_eq!(totals.tax.amount(), dec!(1.07975));
        assert_eq!(totals.rounded_for_display().tax, Money::from_cents(108));
    }
}
