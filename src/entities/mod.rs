//! Entity type definitions
//!
//! FQT supports the following entity types:
//!
//! **Quoting:**
//! - [`Quotation`] - Part quotations with line items and volume pricing
//! - [`Rfq`] - Customer enquiries holding parts to be estimated
//!
//! **Master data:**
//! - [`Material`] - Raw materials with yield, volatility and price history
//! - [`Resource`] - Work centres carrying hourly labour rates
//! - [`Vendor`] - Subcontract and material vendors

pub mod material;
pub mod quotation;
pub mod resource;
pub mod rfq;
pub mod vendor;

pub use material::{Material, PriceRecord, Volatility};
pub use quotation::{MaterialLine, QuantityTier, Quotation, RoutingLine, SubconLine};
pub use resource::{Resource, ResourceType};
pub use rfq::{Rfq, RfqPart};
pub use vendor::Vendor;
