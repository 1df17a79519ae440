//! Material entity - raw materials with price history
//!
//! A material accumulates dated price records over time. The price
//! estimator consumes that history, the yield, the inflation rate and the
//! volatility classification to produce a defensible cost per part.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Price volatility classification
///
/// Drives the contingency rate added on top of the raw material cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Medium,
    High,
}

impl Default for Volatility {
    fn default() -> Self {
        Volatility::Medium
    }
}

impl std::fmt::Display for Volatility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Volatility::Low => write!(f, "low"),
            Volatility::Medium => write!(f, "medium"),
            Volatility::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Volatility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Volatility::Low),
            "medium" => Ok(Volatility::Medium),
            "high" => Ok(Volatility::High),
            _ => Err(format!(
                "Invalid volatility: {}. Use low, medium, or high",
                s
            )),
        }
    }
}

/// A dated price observation for a material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Date the price was observed/quoted
    pub record_date: NaiveDate,

    /// Price per kilogram
    pub price_per_kg: f64,

    /// Where the price came from (vendor, index, quote ref)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A Material entity - raw material with price history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    /// Unique identifier
    pub id: EntityId,

    /// Material name (e.g., "EN AW-6082 T6")
    pub title: String,

    /// Specification / grade reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Fraction of purchased material surviving into the net part weight.
    /// Buy weight = net weight / yield, so yield must be in (0, 1].
    pub default_yield: f64,

    /// Annual inflation rate used to time-adjust stale price records
    #[serde(default)]
    pub inflation_rate_per_year: f64,

    /// Price volatility classification
    #[serde(default)]
    pub volatility: Volatility,

    /// Accumulated dated price observations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_history: Vec<PriceRecord>,

    /// Preferred vendors (VEN- references)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vendors: Vec<String>,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this material)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Material {
    const PREFIX: &'static str = "MAT";

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

impl Material {
    /// Create a new material with the given yield
    pub fn new(title: impl Into<String>, default_yield: f64, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Mat),
            title: title.into(),
            specification: None,
            description: None,
            default_yield,
            inflation_rate_per_year: 0.0,
            volatility: Volatility::default(),
            price_history: Vec::new(),
            vendors: Vec::new(),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Append a price observation, keeping the history date-ordered
    pub fn add_price_record(&mut self, record: PriceRecord) {
        self.price_history.push(record);
        self.price_history
            .sort_by_key(|r| r.record_date);
    }

    /// Most recent price observation, if any
    pub fn latest_price(&self) -> Option<&PriceRecord> {
        self.price_history.iter().max_by_key(|r| r.record_date)
    }
}
