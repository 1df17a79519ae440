//! Costing settings - immutable calculation parameters
//!
//! Resolved once at the call boundary (see `Config::costing_settings`) and
//! passed by reference into every calculation. Never mutated.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::entities::material::Volatility;

/// Effective costing parameters for one calculation
#[derive(Debug, Clone, PartialEq)]
pub struct CostingSettings {
    /// Markup percentage applied to material line costs
    pub material_markup_percent: Decimal,

    /// Markup percentage applied to subcontract line costs
    pub subcon_markup_percent: Decimal,

    /// Hourly labour rate used when a routing resource cannot be resolved
    pub cost_per_hour: Decimal,

    /// Use the ~80th percentile instead of the expected value for estimates
    pub use_p80: bool,

    /// Contingency rate for low-volatility materials
    pub contingency_low: f64,

    /// Contingency rate for medium-volatility materials
    pub contingency_medium: f64,

    /// Contingency rate for high-volatility materials
    pub contingency_high: f64,
}

impl Default for CostingSettings {
    fn default() -> Self {
        Self {
            material_markup_percent: dec!(10),
            subcon_markup_percent: dec!(10),
            cost_per_hour: dec!(60),
            use_p80: false,
            contingency_low: 0.02,
            contingency_medium: 0.05,
            contingency_high: 0.10,
        }
    }
}

impl CostingSettings {
    /// Contingency rate for the given volatility classification
    pub fn contingency_for(&self, volatility: Volatility) -> f64 {
        match volatility {
            Volatility::Low => self.contingency_low,
            Volatility::Medium => self.contingency_medium,
            Volatility::High => self.contingency_high,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contingency_lookup() {
        let settings = CostingSettings::default();
        assert!((settings.contingency_for(Volatility::Low) - 0.02).abs() < 1e-12);
        assert!((settings.contingency_for(Volatility::Medium) - 0.05).abs() < 1e-12);
        assert!((settings.contingency_for(Volatility::High) - 0.10).abs() < 1e-12);
    }
}
