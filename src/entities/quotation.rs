//! Quotation entity - part quotation with volume-tier pricing
//!
//! A quotation owns three child line collections (materials, subcontract
//! operations, routing operations) and an ordered list of quantity tiers.
//! Pricing results are computed by the costing engine and persisted back
//! onto the quotation as `volume_pricing`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::costing::TierPricing;

/// Material line category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialCategory {
    Raw,
    Hardware,
    Consumable,
}

impl Default for MaterialCategory {
    fn default() -> Self {
        MaterialCategory::Raw
    }
}

impl std::fmt::Display for MaterialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MaterialCategory::Raw => write!(f, "raw"),
            MaterialCategory::Hardware => write!(f, "hardware"),
            MaterialCategory::Consumable => write!(f, "consumable"),
        }
    }
}

impl std::str::FromStr for MaterialCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(MaterialCategory::Raw),
            "hardware" => Ok(MaterialCategory::Hardware),
            "consumable" => Ok(MaterialCategory::Consumable),
            _ => Err(format!(
                "Invalid material category: {}. Use raw, hardware, or consumable",
                s
            )),
        }
    }
}

/// A material line on a quotation
///
/// Cost contribution per part = `cost_per_unit * quantity_per_unit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialLine {
    /// Optional reference to a Material entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    /// Line description (e.g., "EN AW-6082 bar, 60mm dia")
    pub description: String,

    /// Cost per unit of material, markup-free
    pub cost_per_unit: Decimal,

    /// Units of material consumed per finished part
    pub quantity_per_unit: Decimal,

    /// Line category
    #[serde(default)]
    pub category: MaterialCategory,

    /// Optional reference to a Vendor entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

impl MaterialLine {
    /// Markup-free cost contribution per single part
    pub fn cost_per_part(&self) -> Decimal {
        self.cost_per_unit * self.quantity_per_unit
    }
}

/// A subcontract line on a quotation
///
/// Subcon pricing is quantity-specific: each line carries the tier
/// quantity it prices, and the costing engine matches lines to tiers by
/// exact quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubconLine {
    /// Optional reference to a Vendor entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    /// Process description (e.g., "Hard anodise 25um")
    pub process: String,

    /// Cost per part at this quantity, markup-free
    pub cost_per_unit: Decimal,

    /// The tier quantity this row prices
    pub quantity: u32,

    /// Certificate of conformity required from the vendor
    #[serde(default)]
    pub cert_required: bool,
}

/// A routing (operation) line on a quotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingLine {
    /// Operation number (10, 20, 30, ...)
    pub op_number: u32,

    /// Optional reference to a Resource entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// One-time setup minutes per batch
    pub setup_minutes: Decimal,

    /// Run minutes per part
    pub run_minutes: Decimal,
}

/// A quantity tier to be priced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityTier {
    /// Order quantity
    pub quantity: u32,

    /// Target margin as a percentage of the final price (0 <= m < 100)
    pub target_margin_percent: Decimal,
}

/// A Quotation entity - part quotation with volume pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quotation {
    /// Unique identifier
    pub id: EntityId,

    /// Part number being quoted
    pub part_number: String,

    /// Part revision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    /// Short title/description
    pub title: String,

    /// Customer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Material lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialLine>,

    /// Subcontract lines (one row per process per tier quantity)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcons: Vec<SubconLine>,

    /// Routing lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routings: Vec<RoutingLine>,

    /// Quantity tiers to price
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tiers: Vec<QuantityTier>,

    /// Computed per-tier pricing (replaced wholesale on each repricing)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_pricing: Vec<TierPricing>,

    /// Op numbers that were priced at the fallback labour rate
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rate_fallback_ops: Vec<u32>,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this quotation)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Quotation {
    const PREFIX: &'static str = "QUOT";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        match self.status {
            Status::Draft => "draft",
            Status::Review => "review",
            Status::Approved => "approved",
            Status::Released => "released",
            Status::Obsolete => "obsolete",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Quotation {
    /// Create a new quotation for a part number
    pub fn new(part_number: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Quot),
            part_number: part_number.into(),
            revision: None,
            title: title.into(),
            customer: None,
            description: None,
            materials: Vec::new(),
            subcons: Vec::new(),
            routings: Vec::new(),
            tiers: Vec::new(),
            volume_pricing: Vec::new(),
            rate_fallback_ops: Vec::new(),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Whether line collections may still be edited
    pub fn is_editable(&self) -> bool {
        self.status.is_editable()
    }

    /// Replace all child line collections in one operation.
    ///
    /// Lines are swapped wholesale, never diffed, and any previously
    /// computed pricing is dropped since it no longer reflects the lines.
    pub fn replace_lines(
        &mut self,
        materials: Vec<MaterialLine>,
        subcons: Vec<SubconLine>,
        routings: Vec<RoutingLine>,
        tiers: Vec<QuantityTier>,
    ) {
        self.materials = materials;
        self.subcons = subcons;
        self.routings = routings;
        self.tiers = tiers;
        self.clear_pricing();
    }

    /// Drop computed pricing (called whenever lines change)
    pub fn clear_pricing(&mut self) {
        self.volume_pricing.clear();
        self.rate_fallback_ops.clear();
    }

    /// Store a fresh pricing result
    pub fn set_pricing(&mut self, pricing: Vec<TierPricing>, fallback_ops: Vec<u32>) {
        self.volume_pricing = pricing;
        self.rate_fallback_ops = fallback_ops;
    }

    /// The distinct resource IDs referenced by routing lines
    pub fn referenced_resources(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .routings
            .iter()
            .filter_map(|r| r.resource.as_deref())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Quotation {
        let mut quot = Quotation::new("PN-1001", "Spindle housing", "test");
        quot.materials.push(MaterialLine {
            material: None,
            description: "6082 bar".to_string(),
            cost_per_unit: dec!(5),
            quantity_per_unit: dec!(2),
            category: MaterialCategory::Raw,
            vendor: None,
        });
        quot.routings.push(RoutingLine {
            op_number: 10,
            resource: None,
            setup_minutes: dec!(10),
            run_minutes: dec!(2),
        });
        quot.tiers.push(QuantityTier {
            quantity: 500,
            target_margin_percent: dec!(35),
        });
        quot
    }

    #[test]
    fn test_quotation_creation() {
        let quot = Quotation::new("PN-1001", "Spindle housing", "test");
        assert!(quot.id.to_string().starts_with("QUOT-"));
        assert_eq!(quot.part_number, "PN-1001");
        assert_eq!(quot.title, "Spindle housing");
        assert!(quot.is_editable());
    }

    #[test]
    fn test_quotation_roundtrip() {
        let quot = sample();
        let yaml = serde_yml::to_string(&quot).unwrap();
        let parsed: Quotation = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(quot.id, parsed.id);
        assert_eq!(parsed.materials.len(), 1);
        assert_eq!(parsed.materials[0].cost_per_unit, dec!(5));
        assert_eq!(parsed.routings[0].setup_minutes, dec!(10));
        assert_eq!(parsed.tiers[0].target_margin_percent, dec!(35));
    }

    #[test]
    fn test_material_line_cost_per_part() {
        let line = MaterialLine {
            material: None,
            description: "bar".to_string(),
            cost_per_unit: dec!(5),
            quantity_per_unit: dec!(2),
            category: MaterialCategory::Raw,
            vendor: None,
        };
        assert_eq!(line.cost_per_part(), dec!(10));
    }

    #[test]
    fn test_replace_lines_clears_pricing() {
        let mut quot = sample();
        quot.volume_pricing.push(crate::costing::TierPricing {
            quantity: 500,
            hours: dec!(1),
            labour_cost: dec!(60),
            material_cost: dec!(0),
            subcon_cost: dec!(0),
            total_cost: dec!(60),
            cost_per_unit: dec!(0.12),
            unit_price: dec!(0.2),
            margin_percent: dec!(40),
        });
        quot.rate_fallback_ops.push(10);

        quot.replace_lines(Vec::new(), Vec::new(), Vec::new(), Vec::new());

        assert!(quot.volume_pricing.is_empty());
        assert!(quot.rate_fallback_ops.is_empty());
        assert!(quot.materials.is_empty());
    }

    #[test]
    fn test_referenced_resources_dedup() {
        let mut quot = sample();
        quot.routings.push(RoutingLine {
            op_number: 20,
            resource: Some("RES-A".to_string()),
            setup_minutes: dec!(5),
            run_minutes: dec!(1),
        });
        quot.routings.push(RoutingLine {
            op_number: 30,
            resource: Some("RES-A".to_string()),
            setup_minutes: dec!(5),
            run_minutes: dec!(1),
        });
        assert_eq!(quot.referenced_resources(), vec!["RES-A"]);
    }

    #[test]
    fn test_entity_trait_implementation() {
        let quot = Quotation::new("PN-1", "Entity Test", "test_author");
        assert_eq!(Quotation::PREFIX, "QUOT");
        assert_eq!(quot.title(), "Entity Test");
        assert_eq!(quot.status(), "draft");
        assert_eq!(quot.author(), "test_author");
    }

    #[test]
    fn test_category_serialization() {
        let quot = sample();
        let yaml = serde_yml::to_string(&quot).unwrap();
        assert!(yaml.contains("category: raw"));
    }
}
