//! Volume-tier cost and price roll-up
//!
//! Rolls labour, material and subcontract costs up per quantity tier and
//! back-solves a unit price from the tier's target margin. Pure
//! computation over the supplied lines: no IO, no shared state, safe to
//! run concurrently for independent quotations.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::costing::error::CostingError;
use crate::costing::settings::CostingSettings;
use crate::entities::quotation::{MaterialLine, QuantityTier, RoutingLine, SubconLine};

/// Computed pricing for one quantity tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierPricing {
    /// Order quantity
    pub quantity: u32,

    /// Total batch hours across all routing lines
    pub hours: Decimal,

    /// Labour cost for the batch
    pub labour_cost: Decimal,

    /// Material cost for the batch, markup included
    pub material_cost: Decimal,

    /// Subcontract cost for the batch, markup included
    pub subcon_cost: Decimal,

    /// labour + material + subcon
    pub total_cost: Decimal,

    /// Total cost divided by quantity
    pub cost_per_unit: Decimal,

    /// Selling price per unit at the target margin
    pub unit_price: Decimal,

    /// The margin the price was solved for
    pub margin_percent: Decimal,
}

/// Result of rolling up a quotation
#[derive(Debug, Clone, PartialEq)]
pub struct RollupResult {
    /// One pricing row per input tier, in input order
    pub tiers: Vec<TierPricing>,

    /// Op numbers priced at the fallback labour rate because their
    /// resource could not be resolved. Provenance for the reviewer, not a
    /// failure.
    pub fallback_ops: Vec<u32>,
}

/// Line collections to roll up, borrowed from a quotation
#[derive(Debug, Clone, Copy)]
pub struct RollupInputs<'a> {
    pub materials: &'a [MaterialLine],
    pub subcons: &'a [SubconLine],
    pub routings: &'a [RoutingLine],
    pub tiers: &'a [QuantityTier],
}

const MINUTES_PER_HOUR: Decimal = dec!(60);
const HUNDRED: Decimal = dec!(100);

/// Validate roll-up inputs before any computation
///
/// Tier quantities must be positive and unique, margins in [0, 100),
/// markups non-negative. If any subcon lines are present, the set of
/// quantities they price must equal the tier quantity set - otherwise a
/// tier would silently lose its subcon cost component.
pub fn validate(inputs: &RollupInputs, settings: &CostingSettings) -> Result<(), CostingError> {
    if inputs.tiers.is_empty() {
        return Err(CostingError::NoTiers);
    }

    for markup in [
        settings.material_markup_percent,
        settings.subcon_markup_percent,
    ] {
        if markup < Decimal::ZERO {
            return Err(CostingError::NegativeMarkup { markup });
        }
    }

    let mut seen: Vec<u32> = Vec::with_capacity(inputs.tiers.len());
    for (index, tier) in inputs.tiers.iter().enumerate() {
        if tier.quantity == 0 {
            return Err(CostingError::ZeroTierQuantity { index });
        }
        if tier.target_margin_percent < Decimal::ZERO || tier.target_margin_percent >= HUNDRED {
            return Err(CostingError::MarginOutOfRange {
                margin: tier.target_margin_percent,
            });
        }
        if seen.contains(&tier.quantity) {
            return Err(CostingError::DuplicateTierQuantity {
                quantity: tier.quantity,
            });
        }
        seen.push(tier.quantity);
    }

    if !inputs.subcons.is_empty() {
        let mut subcon_quantities: Vec<u32> = inputs.subcons.iter().map(|s| s.quantity).collect();
        subcon_quantities.sort_unstable();
        subcon_quantities.dedup();

        let mut tier_quantities = seen;
        tier_quantities.sort_unstable();

        if subcon_quantities != tier_quantities {
            return Err(CostingError::SubconTierMismatch {
                subcon_quantities,
                tier_quantities,
            });
        }
    }

    Ok(())
}

/// Roll costs up and solve prices for every quantity tier.
///
/// `rates` maps resource IDs to hourly rates. Routing lines whose
/// resource is missing from the table (or not set at all) are priced at
/// `settings.cost_per_hour` and reported in `fallback_ops`.
pub fn roll_up(
    inputs: &RollupInputs,
    rates: &HashMap<String, Decimal>,
    settings: &CostingSettings,
) -> Result<RollupResult, CostingError> {
    validate(inputs, settings)?;

    let mut fallback_ops: Vec<u32> = inputs
        .routings
        .iter()
        .filter(|line| {
            line.resource
                .as_ref()
                .and_then(|id| rates.get(id))
                .is_none()
        })
        .map(|line| line.op_number)
        .collect();
    fallback_ops.sort_unstable();
    fallback_ops.dedup();

    // Markup-free material cost for a single part
    let material_raw: Decimal = inputs.materials.iter().map(|m| m.cost_per_part()).sum();

    let material_factor = Decimal::ONE + settings.material_markup_percent / HUNDRED;
    let subcon_factor = Decimal::ONE + settings.subcon_markup_percent / HUNDRED;

    let mut tiers = Vec::with_capacity(inputs.tiers.len());

    for tier in inputs.tiers {
        let quantity = Decimal::from(tier.quantity);

        // Setup is a one-time batch cost; run time scales with quantity.
        let mut batch_minutes = Decimal::ZERO;
        let mut labour_cost = Decimal::ZERO;
        for line in inputs.routings {
            let line_minutes = line.setup_minutes + quantity * line.run_minutes;
            let rate = line
                .resource
                .as_ref()
                .and_then(|id| rates.get(id))
                .copied()
                .unwrap_or(settings.cost_per_hour);
            batch_minutes += line_minutes;
            // Multiply before dividing so whole-cent rates stay exact
            labour_cost += line_minutes * rate / MINUTES_PER_HOUR;
        }
        let hours = batch_minutes / MINUTES_PER_HOUR;

        let material_cost = material_raw * material_factor * quantity;

        let subcon_per_unit: Decimal = inputs
            .subcons
            .iter()
            .filter(|s| s.quantity == tier.quantity)
            .map(|s| s.cost_per_unit)
            .sum::<Decimal>()
            * subcon_factor;
        let subcon_cost = subcon_per_unit * quantity;

        let total_cost = labour_cost + material_cost + subcon_cost;
        let cost_per_unit = total_cost / quantity;
        let margin_fraction = tier.target_margin_percent / HUNDRED;
        let unit_price = cost_per_unit / (Decimal::ONE - margin_fraction);

        tiers.push(TierPricing {
            quantity: tier.quantity,
            hours,
            labour_cost,
            material_cost,
            subcon_cost,
            total_cost,
            cost_per_unit,
            unit_price,
            margin_percent: tier.target_margin_percent,
        });
    }

    Ok(RollupResult {
        tiers,
        fallback_ops,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::quotation::MaterialCategory;

    fn material_line(cost_per_unit: Decimal, quantity_per_unit: Decimal) -> MaterialLine {
        MaterialLine {
            material: None,
            description: "stock".to_string(),
            cost_per_unit,
            quantity_per_unit,
            category: MaterialCategory::Raw,
            vendor: None,
        }
    }

    fn routing_line(op: u32, resource: Option<&str>, setup: Decimal, run: Decimal) -> RoutingLine {
        RoutingLine {
            op_number: op,
            resource: resource.map(String::from),
            setup_minutes: setup,
            run_minutes: run,
        }
    }

    fn tier(quantity: u32, margin: Decimal) -> QuantityTier {
        QuantityTier {
            quantity,
            target_margin_percent: margin,
        }
    }

    fn settings() -> CostingSettings {
        CostingSettings {
            material_markup_percent: dec!(20),
            subcon_markup_percent: dec!(10),
            cost_per_hour: dec!(60),
            ..CostingSettings::default()
        }
    }

    /// One op (10 min setup, 2 min run) at 60/h, one material line
    /// (5 x 2 units) at 20% markup, tier of 500 at 35% margin.
    #[test]
    fn test_single_tier_rollup() {
        let materials = vec![material_line(dec!(5), dec!(2))];
        let routings = vec![routing_line(10, None, dec!(10), dec!(2))];
        let tiers = vec![tier(500, dec!(35))];
        let inputs = RollupInputs {
            materials: &materials,
            subcons: &[],
            routings: &routings,
            tiers: &tiers,
        };

        let result = roll_up(&inputs, &HashMap::new(), &settings()).unwrap();
        assert_eq!(result.tiers.len(), 1);

        let t = &result.tiers[0];
        // 10 + 500 * 2 = 1010 batch minutes
        assert_eq!(t.hours.round_dp(4), dec!(16.8333));
        assert_eq!(t.labour_cost, dec!(1010));
        assert_eq!(t.material_cost, dec!(6000));
        assert_eq!(t.subcon_cost, Decimal::ZERO);
        assert_eq!(t.total_cost, dec!(7010));
        assert_eq!(t.cost_per_unit, dec!(14.02));
        assert_eq!(t.unit_price.round_dp(2), dec!(21.57));
        assert_eq!(t.margin_percent, dec!(35));
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let materials = vec![material_line(dec!(3.17), dec!(1.5))];
        let routings = vec![
            routing_line(10, None, dec!(30), dec!(4.2)),
            routing_line(20, None, dec!(15), dec!(1.1)),
        ];
        let subcons = vec![
            SubconLine {
                vendor: None,
                process: "anodise".to_string(),
                cost_per_unit: dec!(0.85),
                quantity: 100,
                cert_required: false,
            },
            SubconLine {
                vendor: None,
                process: "anodise".to_string(),
                cost_per_unit: dec!(0.70),
                quantity: 250,
                cert_required: false,
            },
        ];
        let tiers = vec![tier(100, dec!(30)), tier(250, dec!(25))];
        let inputs = RollupInputs {
            materials: &materials,
            subcons: &subcons,
            routings: &routings,
            tiers: &tiers,
        };

        let result = roll_up(&inputs, &HashMap::new(), &settings()).unwrap();
        for t in &result.tiers {
            assert_eq!(t.total_cost, t.labour_cost + t.material_cost + t.subcon_cost);
            assert_eq!(t.cost_per_unit, t.total_cost / Decimal::from(t.quantity));
        }
    }

    #[test]
    fn test_subcon_matches_by_tier_quantity() {
        let subcons = vec![
            SubconLine {
                vendor: None,
                process: "plate".to_string(),
                cost_per_unit: dec!(2),
                quantity: 100,
                cert_required: false,
            },
            SubconLine {
                vendor: None,
                process: "plate".to_string(),
                cost_per_unit: dec!(1.50),
                quantity: 500,
                cert_required: false,
            },
        ];
        let tiers = vec![tier(100, dec!(0)), tier(500, dec!(0))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &subcons,
            routings: &[],
            tiers: &tiers,
        };

        let result = roll_up(&inputs, &HashMap::new(), &settings()).unwrap();
        // 10% subcon markup
        assert_eq!(result.tiers[0].subcon_cost, dec!(2.2) * dec!(100));
        assert_eq!(result.tiers[1].subcon_cost, dec!(1.65) * dec!(500));
    }

    #[test]
    fn test_unit_price_increases_with_margin() {
        let materials = vec![material_line(dec!(4), dec!(1))];
        let mut previous = Decimal::ZERO;
        for margin in [dec!(0), dec!(10), dec!(35), dec!(60), dec!(90), dec!(99)] {
            let tiers = vec![tier(100, margin)];
            let inputs = RollupInputs {
                materials: &materials,
                subcons: &[],
                routings: &[],
                tiers: &tiers,
            };
            let result = roll_up(&inputs, &HashMap::new(), &settings()).unwrap();
            let price = result.tiers[0].unit_price;
            assert!(price > previous, "price must rise with margin");
            previous = price;
        }
    }

    #[test]
    fn test_zero_markup_passes_cost_through() {
        let materials = vec![material_line(dec!(7), dec!(3))];
        let tiers = vec![tier(10, dec!(0))];
        let inputs = RollupInputs {
            materials: &materials,
            subcons: &[],
            routings: &[],
            tiers: &tiers,
        };
        let settings = CostingSettings {
            material_markup_percent: Decimal::ZERO,
            ..CostingSettings::default()
        };

        let result = roll_up(&inputs, &HashMap::new(), &settings).unwrap();
        assert_eq!(result.tiers[0].material_cost, dec!(210));
        // margin 0: price equals cost per unit
        assert_eq!(result.tiers[0].unit_price, dec!(21));
    }

    #[test]
    fn test_resource_rates_resolved_per_line() {
        let routings = vec![
            routing_line(10, Some("RES-A"), dec!(0), dec!(6)),
            routing_line(20, Some("RES-B"), dec!(0), dec!(6)),
        ];
        let tiers = vec![tier(10, dec!(0))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &routings,
            tiers: &tiers,
        };
        let mut rates = HashMap::new();
        rates.insert("RES-A".to_string(), dec!(60));
        rates.insert("RES-B".to_string(), dec!(120));

        let result = roll_up(&inputs, &rates, &settings()).unwrap();
        // 60 min at 60/h + 60 min at 120/h
        assert_eq!(result.tiers[0].labour_cost, dec!(180));
        assert!(result.fallback_ops.is_empty());
    }

    #[test]
    fn test_unresolved_resource_uses_fallback_and_is_reported() {
        let routings = vec![
            routing_line(10, Some("RES-A"), dec!(0), dec!(6)),
            routing_line(20, Some("RES-MISSING"), dec!(0), dec!(6)),
            routing_line(30, None, dec!(0), dec!(6)),
        ];
        let tiers = vec![tier(10, dec!(0))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &routings,
            tiers: &tiers,
        };
        let mut rates = HashMap::new();
        rates.insert("RES-A".to_string(), dec!(120));

        let result = roll_up(&inputs, &rates, &settings()).unwrap();
        assert_eq!(result.fallback_ops, vec![20, 30]);
        // 60 min at 120/h + 2 x 60 min at the 60/h fallback
        assert_eq!(result.tiers[0].labour_cost, dec!(240));
    }

    #[test]
    fn test_zero_quantity_tier_rejected() {
        let tiers = vec![tier(0, dec!(35))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &[],
            tiers: &tiers,
        };
        let err = roll_up(&inputs, &HashMap::new(), &settings()).unwrap_err();
        assert_eq!(err, CostingError::ZeroTierQuantity { index: 0 });
    }

    #[test]
    fn test_margin_100_rejected() {
        let tiers = vec![tier(100, dec!(100))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &[],
            tiers: &tiers,
        };
        let err = roll_up(&inputs, &HashMap::new(), &settings()).unwrap_err();
        assert_eq!(
            err,
            CostingError::MarginOutOfRange {
                margin: dec!(100)
            }
        );
    }

    #[test]
    fn test_negative_margin_rejected() {
        let tiers = vec![tier(100, dec!(-5))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &[],
            tiers: &tiers,
        };
        let err = roll_up(&inputs, &HashMap::new(), &settings()).unwrap_err();
        assert!(matches!(err, CostingError::MarginOutOfRange { .. }));
    }

    #[test]
    fn test_empty_tiers_rejected() {
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &[],
            tiers: &[],
        };
        let err = roll_up(&inputs, &HashMap::new(), &settings()).unwrap_err();
        assert_eq!(err, CostingError::NoTiers);
    }

    #[test]
    fn test_duplicate_tier_quantity_rejected() {
        let tiers = vec![tier(100, dec!(30)), tier(100, dec!(20))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &[],
            tiers: &tiers,
        };
        let err = roll_up(&inputs, &HashMap::new(), &settings()).unwrap_err();
        assert_eq!(err, CostingError::DuplicateTierQuantity { quantity: 100 });
    }

    #[test]
    fn test_subcon_tier_mismatch_rejected() {
        let subcons = vec![SubconLine {
            vendor: None,
            process: "plate".to_string(),
            cost_per_unit: dec!(2),
            quantity: 250,
            cert_required: false,
        }];
        let tiers = vec![tier(100, dec!(30)), tier(500, dec!(30))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &subcons,
            routings: &[],
            tiers: &tiers,
        };
        let err = roll_up(&inputs, &HashMap::new(), &settings()).unwrap_err();
        assert_eq!(
            err,
            CostingError::SubconTierMismatch {
                subcon_quantities: vec![250],
                tier_quantities: vec![100, 500],
            }
        );
    }

    #[test]
    fn test_no_subcon_lines_is_valid() {
        let tiers = vec![tier(100, dec!(30))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &[],
            tiers: &tiers,
        };
        let result = roll_up(&inputs, &HashMap::new(), &settings()).unwrap();
        assert_eq!(result.tiers[0].subcon_cost, Decimal::ZERO);
    }

    #[test]
    fn test_negative_markup_rejected() {
        let tiers = vec![tier(100, dec!(30))];
        let inputs = RollupInputs {
            materials: &[],
            subcons: &[],
            routings: &[],
            tiers: &tiers,
        };
        let settings = CostingSettings {
            material_markup_percent: dec!(-1),
            ..CostingSettings::default()
        };
        let err = roll_up(&inputs, &HashMap::new(), &settings).unwrap_err();
        assert_eq!(err, CostingError::NegativeMarkup { markup: dec!(-1) });
    }

    #[test]
    fn test_tier_pricing_roundtrip() {
        let pricing = TierPricing {
            quantity: 500,
            hours: dec!(16.83),
            labour_cost: dec!(1010),
            material_cost: dec!(6000),
            subcon_cost: Decimal::ZERO,
            total_cost: dec!(7010),
            cost_per_unit: dec!(14.02),
            unit_price: dec!(21.57),
            margin_percent: dec!(35),
        };
        let yaml = serde_yml::to_string(&pricing).unwrap();
        let parsed: TierPricing = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(pricing, parsed);
    }
}
