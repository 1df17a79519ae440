//! Material price estimation from historical price records
//!
//! Produces a deterministic PERT three-point estimate (no AI, no
//! randomness): each historical price is compounded forward for inflation,
//! the adjusted spread gives low/most-likely/high, and the chosen price is
//! turned into a per-part cost via the material yield and a
//! volatility-based contingency.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::costing::error::CostingError;
use crate::costing::settings::CostingSettings;
use crate::entities::material::{Material, PriceRecord};

const DAYS_PER_YEAR: f64 = 365.25;

/// Factor applied to the standard deviation for the ~80th percentile
/// under the PERT normal approximation
const P80_Z: f64 = 0.84;

/// PERT three-point estimate over time-adjusted prices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PertEstimate {
    /// Lowest adjusted price
    pub low: f64,

    /// Median adjusted price
    pub most_likely: f64,

    /// Highest adjusted price
    pub high: f64,

    /// PERT-weighted expected value: (low + 4*most_likely + high) / 6
    pub expected: f64,

    /// (high - low) / 6
    pub std_dev: f64,

    /// expected + 0.84 * std_dev
    pub p80: f64,
}

impl PertEstimate {
    /// Build a PERT estimate from unsorted adjusted prices.
    ///
    /// A single price degenerates to zero spread, which is valid.
    fn from_prices(mut prices: Vec<f64>) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        prices.sort_by(|a, b| a.partial_cmp(b).expect("prices are finite"));

        let low = prices[0];
        let high = prices[prices.len() - 1];
        let most_likely = median_of_sorted(&prices);

        let expected = (low + 4.0 * most_likely + high) / 6.0;
        let std_dev = (high - low) / 6.0;
        let p80 = expected + P80_Z * std_dev;

        Some(Self {
            low,
            most_likely,
            high,
            expected,
            std_dev,
            p80,
        })
    }
}

/// Full per-part material cost estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialEstimate {
    /// The underlying price statistics
    pub pert: PertEstimate,

    /// The price per kg the cost was computed from (expected or p80)
    pub price_per_kg: f64,

    /// Net weight divided by yield; always >= net weight
    pub buy_weight_per_part_kg: f64,

    /// Buy weight x quantity x price per kg
    pub raw_material_cost: f64,

    /// Volatility contingency on top of the raw cost
    pub contingency: f64,

    /// (raw + contingency) / quantity
    pub cost_per_part: f64,
}

/// Compound a historical price forward to present value.
///
/// Records dated in the future are treated as current rather than
/// discounted; the adjustment only compensates stale quotes.
fn adjust_for_inflation(record: &PriceRecord, inflation_rate: f64, as_of: NaiveDate) -> f64 {
    let days = (as_of - record.record_date).num_days();
    let years = (days as f64 / DAYS_PER_YEAR).max(0.0);
    record.price_per_kg * (1.0 + inflation_rate).powf(years)
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Estimate the PERT price statistics for a material as of a given date.
///
/// Fails with `NoPriceHistory` when the material has no records - an
/// absent estimate must never be reported as a zero cost.
pub fn estimate_price_per_kg(
    material: &Material,
    as_of: NaiveDate,
) -> Result<PertEstimate, CostingError> {
    let adjusted: Vec<f64> = material
        .price_history
        .iter()
        .map(|r| adjust_for_inflation(r, material.inflation_rate_per_year, as_of))
        .collect();

    PertEstimate::from_prices(adjusted).ok_or_else(|| CostingError::NoPriceHistory {
        material: material.title.clone(),
    })
}

/// Estimate the material cost per part for a requested quantity.
pub fn estimate_material_cost(
    material: &Material,
    net_weight_kg: f64,
    quantity: u32,
    as_of: NaiveDate,
    settings: &CostingSettings,
) -> Result<MaterialEstimate, CostingError> {
    if !(material.default_yield > 0.0 && material.default_yield <= 1.0) {
        return Err(CostingError::YieldOutOfRange {
            value: material.default_yield,
        });
    }
    if net_weight_kg <= 0.0 {
        return Err(CostingError::NonPositiveWeight {
            value: net_weight_kg,
        });
    }
    if quantity == 0 {
        return Err(CostingError::ZeroQuantity);
    }

    let pert = estimate_price_per_kg(material, as_of)?;

    let price_per_kg = if settings.use_p80 {
        pert.p80
    } else {
        pert.expected
    };

    let buy_weight_per_part_kg = net_weight_kg / material.default_yield;
    let total_buy_weight = buy_weight_per_part_kg * quantity as f64;
    let raw_material_cost = total_buy_weight * price_per_kg;
    let contingency = raw_material_cost * settings.contingency_for(material.volatility);
    let cost_per_part = (raw_material_cost + contingency) / quantity as f64;

    Ok(MaterialEstimate {
        pert,
        price_per_kg,
        buy_weight_per_part_kg,
        raw_material_cost,
        contingency,
        cost_per_part,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::material::Volatility;

    const EPS: f64 = 1e-9;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn material_with_prices(prices: &[(NaiveDate, f64)]) -> Material {
        let mut mat = Material::new("EN AW-6082", 0.6, "test");
        mat.volatility = Volatility::Medium;
        for (date, price) in prices {
            mat.add_price_record(PriceRecord {
                record_date: *date,
                price_per_kg: *price,
                source: None,
            });
        }
        mat
    }

    /// Three same-day records at 10/12/14 per kg, no inflation, yield 0.6,
    /// 1 kg net, qty 100, medium volatility at 5% contingency.
    #[test]
    fn test_three_point_estimate() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[
            (as_of, 10.0),
            (as_of, 12.0),
            (as_of, 14.0),
        ]);

        let est = estimate_material_cost(&mat, 1.0, 100, as_of, &CostingSettings::default())
            .unwrap();

        assert!((est.pert.low - 10.0).abs() < EPS);
        assert!((est.pert.most_likely - 12.0).abs() < EPS);
        assert!((est.pert.high - 14.0).abs() < EPS);
        assert!((est.pert.expected - 12.0).abs() < EPS);
        assert!((est.pert.std_dev - 4.0 / 6.0).abs() < EPS);
        assert!((est.buy_weight_per_part_kg - 1.0 / 0.6).abs() < EPS);
        assert!((est.raw_material_cost - 2000.0).abs() < 1e-6);
        assert!((est.contingency - 100.0).abs() < 1e-6);
        assert!((est.cost_per_part - 21.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_history_is_unavailable_not_zero() {
        let mat = Material::new("Unobtainium", 0.5, "test");
        let err =
            estimate_material_cost(&mat, 1.0, 10, day(2026, 3, 1), &CostingSettings::default())
                .unwrap_err();
        assert!(matches!(err, CostingError::NoPriceHistory { .. }));
    }

    #[test]
    fn test_single_record_degenerates_to_zero_spread() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[(as_of, 8.5)]);

        let pert = estimate_price_per_kg(&mat, as_of).unwrap();
        assert!((pert.low - 8.5).abs() < EPS);
        assert!((pert.most_likely - 8.5).abs() < EPS);
        assert!((pert.high - 8.5).abs() < EPS);
        assert!((pert.expected - 8.5).abs() < EPS);
        assert!(pert.std_dev.abs() < EPS);
        assert!((pert.p80 - 8.5).abs() < EPS);
    }

    #[test]
    fn test_even_count_uses_middle_average() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[
            (as_of, 10.0),
            (as_of, 11.0),
            (as_of, 13.0),
            (as_of, 20.0),
        ]);

        let pert = estimate_price_per_kg(&mat, as_of).unwrap();
        assert!((pert.most_likely - 12.0).abs() < EPS);
    }

    #[test]
    fn test_pert_bounds() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[
            (as_of, 3.0),
            (as_of, 9.0),
            (as_of, 4.0),
            (as_of, 7.5),
            (as_of, 5.0),
        ]);

        let pert = estimate_price_per_kg(&mat, as_of).unwrap();
        assert!(pert.low <= pert.most_likely && pert.most_likely <= pert.high);
        assert!(pert.low <= pert.expected && pert.expected <= pert.high);
        assert!(pert.std_dev >= 0.0);
        assert!(pert.p80 > pert.expected);
    }

    #[test]
    fn test_inflation_adjustment_compounds_forward() {
        let as_of = day(2026, 3, 1);
        let mut mat = material_with_prices(&[(day(2025, 3, 1), 10.0)]);
        mat.inflation_rate_per_year = 0.10;

        let pert = estimate_price_per_kg(&mat, as_of).unwrap();
        // one year back: roughly 10 * 1.1
        assert!((pert.expected - 11.0).abs() < 0.01);
    }

    #[test]
    fn test_future_dated_record_not_discounted() {
        let as_of = day(2026, 3, 1);
        let mut mat = material_with_prices(&[(day(2026, 9, 1), 10.0)]);
        mat.inflation_rate_per_year = 0.10;

        let pert = estimate_price_per_kg(&mat, as_of).unwrap();
        assert!((pert.expected - 10.0).abs() < EPS);
    }

    #[test]
    fn test_buy_weight_never_below_net_weight() {
        let as_of = day(2026, 3, 1);
        for yield_value in [0.2, 0.6, 1.0] {
            let mut mat = material_with_prices(&[(as_of, 5.0)]);
            mat.default_yield = yield_value;
            let est =
                estimate_material_cost(&mat, 2.0, 10, as_of, &CostingSettings::default()).unwrap();
            assert!(est.buy_weight_per_part_kg >= 2.0);
            if yield_value == 1.0 {
                assert!((est.buy_weight_per_part_kg - 2.0).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_cost_per_part_invariant_under_quantity() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[(as_of, 10.0), (as_of, 12.0), (as_of, 14.0)]);

        let a = estimate_material_cost(&mat, 1.0, 100, as_of, &CostingSettings::default())
            .unwrap();
        let b = estimate_material_cost(&mat, 1.0, 200, as_of, &CostingSettings::default())
            .unwrap();
        assert!((a.cost_per_part - b.cost_per_part).abs() < EPS);
    }

    #[test]
    fn test_p80_selection() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[(as_of, 10.0), (as_of, 12.0), (as_of, 14.0)]);
        let settings = CostingSettings {
            use_p80: true,
            ..CostingSettings::default()
        };

        let est = estimate_material_cost(&mat, 1.0, 100, as_of, &settings).unwrap();
        let expected_p80 = 12.0 + 0.84 * (4.0 / 6.0);
        assert!((est.price_per_kg - expected_p80).abs() < EPS);
        assert!(est.price_per_kg > est.pert.expected);
    }

    #[test]
    fn test_zero_yield_rejected() {
        let as_of = day(2026, 3, 1);
        let mut mat = material_with_prices(&[(as_of, 5.0)]);
        mat.default_yield = 0.0;
        let err = estimate_material_cost(&mat, 1.0, 10, as_of, &CostingSettings::default())
            .unwrap_err();
        assert!(matches!(err, CostingError::YieldOutOfRange { .. }));
    }

    #[test]
    fn test_yield_above_one_rejected() {
        let as_of = day(2026, 3, 1);
        let mut mat = material_with_prices(&[(as_of, 5.0)]);
        mat.default_yield = 1.2;
        let err = estimate_material_cost(&mat, 1.0, 10, as_of, &CostingSettings::default())
            .unwrap_err();
        assert!(matches!(err, CostingError::YieldOutOfRange { .. }));
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[(as_of, 5.0)]);
        let err = estimate_material_cost(&mat, 0.0, 10, as_of, &CostingSettings::default())
            .unwrap_err();
        assert!(matches!(err, CostingError::NonPositiveWeight { .. }));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let as_of = day(2026, 3, 1);
        let mat = material_with_prices(&[(as_of, 5.0)]);
        let err = estimate_material_cost(&mat, 1.0, 0, as_of, &CostingSettings::default())
            .unwrap_err();
        assert_eq!(err, CostingError::ZeroQuantity);
    }

    #[test]
    fn test_contingency_follows_volatility() {
        let as_of = day(2026, 3, 1);
        let settings = CostingSettings::default();

        let mut low = material_with_prices(&[(as_of, 10.0)]);
        low.volatility = Volatility::Low;
        let mut high = material_with_prices(&[(as_of, 10.0)]);
        high.volatility = Volatility::High;

        let low_est = estimate_material_cost(&low, 1.0, 10, as_of, &settings).unwrap();
        let high_est = estimate_material_cost(&high, 1.0, 10, as_of, &settings).unwrap();
        assert!(high_est.contingency > low_est.contingency);
        assert!(high_est.cost_per_part > low_est.cost_per_part);
    }
}
