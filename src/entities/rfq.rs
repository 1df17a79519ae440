//! RFQ entity - customer enquiries with parts to be estimated

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// A part requested on an enquiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfqPart {
    /// Customer part number
    pub part_number: String,

    /// Part description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reference to a Material entity (MAT-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    /// Net finished-part weight in kilograms
    pub net_weight_kg: f64,

    /// Quantities the customer asked to be priced
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quantities: Vec<u32>,
}

/// An Rfq entity - customer enquiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rfq {
    /// Unique identifier
    pub id: EntityId,

    /// Enquiry title
    pub title: String,

    /// Customer name
    pub customer: String,

    /// Customer's enquiry reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Response due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Parts to be estimated
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<RfqPart>,

    /// Quotations raised from this enquiry (QUOT- references)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quotations: Vec<String>,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this enquiry)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Rfq {
    const PREFIX: &'static str = "RFQ";

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

impl Rfq {
    /// Create a new enquiry for a customer
    pub fn new(
        title: impl Into<String>,
        customer: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Rfq),
            title: title.into(),
            customer: customer.into(),
            reference: None,
            due_date: None,
            parts: Vec::new(),
            quotations: Vec::new(),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Add a part to the enquiry
    pub fn add_part(&mut self, part: RfqPart) {
        self.parts.push(part);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfq_creation() {
        let rfq = Rfq::new("Q3 machining package", "Borealis GmbH", "test");
        assert!(rfq.id.to_string().starts_with("RFQ-"));
        assert_eq!(rfq.customer, "Borealis GmbH");
        assert!(rfq.parts.is_empty());
    }

    #[test]
    fn test_rfq_roundtrip() {
        let mut rfq = Rfq::new("Q3 machining package", "Borealis GmbH", "test");
        rfq.add_part(RfqPart {
            part_number: "BX-100".to_string(),
            description: Some("Manifold block".to_string()),
            material: None,
            net_weight_kg: 1.2,
            quantities: vec![100, 500],
        });

        let yaml = serde_yml::to_string(&rfq).unwrap();
        let parsed: Rfq = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(rfq.id, parsed.id);
        assert_eq!(parsed.parts.len(), 1);
        assert_eq!(parsed.parts[0].quantities, vec![100, 500]);
    }

    #[test]
    fn test_entity_trait_implementation() {
        let rfq = Rfq::new("Test Enquiry", "Customer", "test_author");
        assert_eq!(Rfq::PREFIX, "RFQ");
        assert_eq!(rfq.title(), "Test Enquiry");
        assert_eq!(rfq.status(), "draft");
        assert_eq!(rfq.author(), "test_author");
    }
}
