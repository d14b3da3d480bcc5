//! Typed EDM metadata for the OData conformance checker.
//!
//! The `odata-edm` crate turns an OData CSDL `$metadata` document into typed
//! Rust descriptions of the service's entity model — entity types with their
//! key and structural properties, the entity container's sets, and the
//! `Org.OData.Capabilities.V1` restriction annotations the conformance rules
//! consult before probing a service.
//!
//! # Entry Point
//!
//! ```
//! let xml = r#"<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx"
//!                         Version="4.0"><edmx:DataServices/></edmx:Edmx>"#;
//! let metadata = odata_edm::edmx::parse(xml).unwrap();
//! assert!(metadata.entity_types.is_empty());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod capabilities;
pub mod edmx;
pub mod model;

pub use capabilities::{CapabilityIndex, CapabilityRestriction};
pub use edmx::EdmError;
pub use model::{entity_set_url, EntitySet, EntityType, Property, ServiceMetadata};
