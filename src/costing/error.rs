//! Typed errors for the costing engines
//!
//! Validation failures are raised before any partial computation runs and
//! are never coerced into zero, NaN or infinite results.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the roll-up engine and the price estimator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostingError {
    #[error("quotation has no quantity tiers to price")]
    NoTiers,

    #[error("quantity tier {index} has zero quantity")]
    ZeroTierQuantity { index: usize },

    #[error("tier quantity {quantity} appears more than once")]
    DuplicateTierQuantity { quantity: u32 },

    #[error("target margin {margin}% is out of range (must be >= 0 and < 100)")]
    MarginOutOfRange { margin: Decimal },

    #[error("markup {markup}% is negative")]
    NegativeMarkup { markup: Decimal },

    #[error(
        "subcon pricing quantities {subcon_quantities:?} do not match tier quantities {tier_quantities:?}"
    )]
    SubconTierMismatch {
        subcon_quantities: Vec<u32>,
        tier_quantities: Vec<u32>,
    },

    #[error("material '{material}' has no price history; no estimate is available")]
    NoPriceHistory { material: String },

    #[error("material yield {value} is out of range (must be > 0 and <= 1)")]
    YieldOutOfRange { value: f64 },

    #[error("net weight must be positive (got {value} kg)")]
    NonPositiveWeight { value: f64 },

    #[error("requested quantity must be positive")]
    ZeroQuantity,
}
