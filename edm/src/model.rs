//! Typed descriptions of an OData entity model.
//!
//! These types carry only what the conformance rules consume: entity types
//! with their key and structural properties, the container's entity sets,
//! and the capability index built from annotations. All instances are owned
//! and read-only once parsed; rules never mutate metadata.

use url::Url;

use crate::capabilities::CapabilityIndex;

/// A declared structural property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name as declared in the schema.
    pub name: String,
    /// Declared EDM type (e.g., `"Edm.String"`), kept verbatim.
    pub type_name: String,
}

/// An entity type declared in the metadata document.
///
/// Key properties are split out of [`properties`](Self::properties): the
/// `properties` list holds only the normal (non-key) structural properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityType {
    /// Unqualified type name (e.g., `"Product"`).
    pub name: String,
    /// Declared types of the key properties, in `PropertyRef` order.
    pub key_types: Vec<String>,
    /// Normal (non-key) structural properties.
    pub properties: Vec<Property>,
    /// True for media entity types (`HasStream="true"`).
    pub has_stream: bool,
}

/// An entity set declared in the entity container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySet {
    /// Set name — also the last URL segment of the collection.
    pub name: String,
    /// Unqualified name of the set's entity type.
    pub entity_type: String,
}

/// Everything the conformance rules read from a parsed `$metadata` document.
///
/// `entity_types` and `entity_sets` preserve document order, which is the
/// stable enumeration order candidate selection relies on.
#[derive(Debug, Clone, Default)]
pub struct ServiceMetadata {
    /// All entity types, in document order.
    pub entity_types: Vec<EntityType>,
    /// All entity sets of the container, in document order.
    pub entity_sets: Vec<EntitySet>,
    /// Capability restrictions read from annotations.
    pub capabilities: CapabilityIndex,
}

impl ServiceMetadata {
    /// Returns the first entity set whose entity type matches `type_name`.
    #[must_use]
    pub fn entity_set_for(&self, type_name: &str) -> Option<&EntitySet> {
        self.entity_sets.iter().find(|s| s.entity_type == type_name)
    }
}

/// Resolves the collection URL of an entity set (or of a service segment
/// such as `$metadata` or `$batch`) against the service root.
///
/// # Errors
///
/// Returns an error if the segment cannot be joined onto the root URL.
pub fn entity_set_url(root: &Url, segment: &str) -> Result<Url, url::ParseError> {
    let mut base = root.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_url_joins_with_and_without_trailing_slash() -> Result<(), url::ParseError> {
        let bare = Url::parse("https://host.example/service")?;
        let slashed = Url::parse("https://host.example/service/")?;
        assert_eq!(
            entity_set_url(&bare, "Products")?.as_str(),
            "https://host.example/service/Products"
        );
        assert_eq!(
            entity_set_url(&slashed, "$batch")?.as_str(),
            "https://host.example/service/$batch"
        );
        Ok(())
    }

    #[test]
    fn entity_set_lookup_matches_type_name() {
        let metadata = ServiceMetadata {
            entity_types: Vec::new(),
            entity_sets: vec![EntitySet {
                name: "Products".into(),
                entity_type: "Product".into(),
            }],
            capabilities: CapabilityIndex::default(),
        };
        assert_eq!(
            metadata.entity_set_for("Product").map(|s| s.name.as_str()),
            Some("Products")
        );
        assert!(metadata.entity_set_for("Order").is_none());
    }
}
