//! Costing engines - volume-tier roll-up and material price estimation
//!
//! Both engines are pure, synchronous functions over already-loaded data.
//! Callers fetch entities and resolve settings first, then invoke; there
//! is no IO or shared mutable state inside this module.

pub mod error;
pub mod estimator;
pub mod rollup;
pub mod settings;

pub use error::CostingError;
pub use estimator::{estimate_material_cost, estimate_price_per_kg, MaterialEstimate, PertEstimate};
pub use rollup::{roll_up, RollupInputs, RollupResult, TierPricing};
pub use settings::CostingSettings;
