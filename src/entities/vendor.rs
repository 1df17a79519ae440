//! Vendor entity - subcontract and material vendors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Contact information for a vendor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Contact name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A Vendor entity - external supplier of processes or material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    /// Unique identifier
    pub id: EntityId,

    /// Vendor name
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Processes offered (e.g., "anodising", "heat treatment")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processes: Vec<String>,

    /// Certifications held (e.g., "ISO 9001", "Nadcap HT")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<String>,

    /// Typical lead time in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,

    /// Contact information
    #[serde(default)]
    pub contact: Contact,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this vendor)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Vendor {
    const PREFIX: &'static str = "VEN";

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

impl Vendor {
    /// Create a new vendor
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ven),
            title: title.into(),
            description: None,
            processes: Vec::new(),
            certifications: Vec::new(),
            lead_time_days: None,
            contact: Contact::default(),
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Whether this vendor holds the named certification
    pub fn is_certified(&self, cert: &str) -> bool {
        self.certifications
            .iter()
            .any(|c| c.eq_ignore_ascii_case(cert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_creation() {
        let ven = Vendor::new("Acme Anodising", "test");
        assert!(ven.id.to_string().starts_with("VEN-"));
        assert_eq!(ven.title, "Acme Anodising");
    }

    #[test]
    fn test_vendor_roundtrip() {
        let mut ven = Vendor::new("Acme Anodising", "test");
        ven.processes.push("anodising".to_string());
        ven.certifications.push("ISO 9001".to_string());
        ven.lead_time_days = Some(10);

        let yaml = serde_yml::to_string(&ven).unwrap();
        let parsed: Vendor = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(ven.id, parsed.id);
        assert_eq!(parsed.processes, vec!["anodising"]);
        assert_eq!(parsed.lead_time_days, Some(10));
    }

    #[test]
    fn test_is_certified_case_insensitive() {
        let mut ven = Vendor::new("Acme", "test");
        ven.certifications.push("ISO 9001".to_string());
        assert!(ven.is_certified("iso 9001"));
        assert!(!ven.is_certified("Nadcap"));
    }

    #[test]
    fn test_entity_trait_implementation() {
        let ven = Vendor::new("Test Vendor", "test_author");
        assert_eq!(Vendor::PREFIX, "VEN");
        assert_eq!(ven.title(), "Test Vendor");
        assert_eq!(ven.status(), "draft");
        assert_eq!(ven.author(), "test_author");
    }
}
