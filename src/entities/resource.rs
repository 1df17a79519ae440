//! Resource entity - work centres with hourly rates

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Resource type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Turning,
    Milling,
    Grinding,
    Edm,
    Inspection,
    Assembly,
    Finishing,
    Manual,
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType::Milling
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Turning => write!(f, "turning"),
            ResourceType::Milling => write!(f, "milling"),
            ResourceType::Grinding => write!(f, "grinding"),
            ResourceType::Edm => write!(f, "edm"),
            ResourceType::Inspection => write!(f, "inspection"),
            ResourceType::Assembly => write!(f, "assembly"),
            ResourceType::Finishing => write!(f, "finishing"),
            ResourceType::Manual => write!(f, "manual"),
        }
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "turning" => Ok(ResourceType::Turning),
            "milling" => Ok(ResourceType::Milling),
            "grinding" => Ok(ResourceType::Grinding),
            "edm" => Ok(ResourceType::Edm),
            "inspection" => Ok(ResourceType::Inspection),
            "assembly" => Ok(ResourceType::Assembly),
            "finishing" => Ok(ResourceType::Finishing),
            "manual" => Ok(ResourceType::Manual),
            _ => Err(format!(
                "Invalid resource type: {}. Use turning, milling, grinding, edm, inspection, assembly, finishing, or manual",
                s
            )),
        }
    }
}

/// A Resource entity - work centre carrying the labour rate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique identifier
    pub id: EntityId,

    /// Resource name (e.g., "DMG MORI NLX 2500")
    pub title: String,

    /// Detailed description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Resource type classification
    #[serde(default)]
    pub resource_type: ResourceType,

    /// Fully burdened hourly rate
    pub cost_per_hour: Decimal,

    /// Tags for filtering
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this resource)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Resource {
    const PREFIX: &'static str = "RES";

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

impl Resource {
    /// Create a new resource with the given hourly rate
    pub fn new(
        title: impl Into<String>,
        resource_type: ResourceType,
        cost_per_hour: Decimal,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Res),
            title: title.into(),
            description: None,
            resource_type,
            cost_per_hour,
            tags: Vec::new(),
            status: Status::default(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_resource_creation() {
        let res = Resource::new("NLX 2500", ResourceType::Turning, dec!(72.50), "test");
        assert!(res.id.to_string().starts_with("RES-"));
        assert_eq!(res.cost_per_hour, dec!(72.50));
        assert_eq!(res.resource_type, ResourceType::Turning);
    }

    #[test]
    fn test_resource_roundtrip() {
        let res = Resource::new("CMM", ResourceType::Inspection, dec!(45), "test");
        let yaml = serde_yml::to_string(&res).unwrap();
        let parsed: Resource = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(res.id, parsed.id);
        assert_eq!(parsed.cost_per_hour, dec!(45));
        assert_eq!(parsed.resource_type, ResourceType::Inspection);
    }

    #[test]
    fn test_resource_type_serialization() {
        let res = Resource::new("Wire EDM", ResourceType::Edm, dec!(90), "test");
        let yaml = serde_yml::to_string(&res).unwrap();
        assert!(yaml.contains("resource_type: edm"));
    }

    #[test]
    fn test_resource_type_from_str() {
        assert_eq!("milling".parse::<ResourceType>().unwrap(), ResourceType::Milling);
        assert!("cnc".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_entity_trait_implementation() {
        let res = Resource::new("Test Resource", ResourceType::Manual, dec!(30), "test_author");
        assert_eq!(Resource::PREFIX, "RES");
        assert_eq!(res.title(), "Test Resource");
        assert_eq!(res.status(), "draft");
        assert_eq!(res.author(), "test_author");
    }
}
