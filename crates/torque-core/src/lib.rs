//! # torque-core: Pure Billing Logic for Torque
//!
//! This crate holds the shop's pricing rules as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Torque Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Frontend (estimates, invoices, printing)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 torque-client (async)                           │   │
//! │  │    RequestController, ResponseCache, SettingsStore              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ShopSettings, BillableItems           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ torque-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   types   │  │  billing  │  │ validation│  │   │
//! │  │   │   Money   │  │   Part    │  │  compute_ │  │  settings │  │   │
//! │  │   │   Rate    │  │ LaborLine │  │  totals   │  │  updates  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money` and fractional `Rate`
//! - [`types`] - Parts, labor, shop settings, totals breakdown
//! - [`billing`] - The totals pipeline
//! - [`validation`] - Settings update rules
//! - [`error`] - Validation error types
//!
//! ## Example Usage
//!
//! ```rust
//! use torque_core::{BillableItems, ShopSettings};
//!
//! let job: BillableItems = serde_json::from_str(
//!     r#"{ "parts": [{ "cost": "45.00", "quantity": 2 }], "labor": [{ "hours": 1.5 }] }"#,
//! ).unwrap();
//!
//! let totals = job.totals(&ShopSettings::default());
//! assert_eq!(totals.total, totals.subtotal + totals.shop_supplies + totals.tax);
//! println!("Total due: {}", totals.total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::compute_totals;
pub use error::{ValidationError, ValidationResult};
pub use money::{Money, Rate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default sales tax: 8.75%.
pub const DEFAULT_TAX_RATE_BPS: u32 = 875;

/// Default hourly labor rate in dollars.
pub const DEFAULT_LABOR_RATE_DOLLARS: i64 = 140;

/// Default parts markup: 35%.
pub const DEFAULT_PARTS_MARKUP_BPS: u32 = 3500;

/// Default shop supplies surcharge: 5%.
pub const DEFAULT_SHOP_SUPPLIES_BPS: u32 = 500;

/// Default diagnostic fee in dollars.
pub const DEFAULT_DIAGNOSTIC_FEE_DOLLARS: i64 = 150;

/// Upper bound for tax and shop supplies rates (100%).
pub const MAX_PERCENT_RATE_BPS: u32 = 10_000;

/// Upper bound for parts markup (1000%).
///
/// ## Business Reason
/// Catches a markup typed as a percentage (`35`) instead of a fraction
/// (`0.35`), which would bill parts at 36× cost.
pub const MAX_MARKUP_BPS: u32 = 100_000;

/// Upper bound for labor rate and diagnostic fee, in dollars.
pub const MAX_LABOR_RATE_DOLLARS: i64 = 10_000;
