//! CSDL (`$metadata`) reader.
//!
//! Reads the subset of an EDMX document the conformance rules consume:
//! entity types with keys, structural properties, and the media flag; the
//! entity container's sets; and capability annotations, whether inline on
//! the annotated element or in an out-of-line `<Annotations>` block.
//! Unknown elements are skipped, so vendor extensions do not break parsing.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::capabilities::{
    TERM_BATCH_SUPPORTED, TERM_DELETE_RESTRICTIONS, TERM_INSERT_RESTRICTIONS,
    TERM_UPDATE_RESTRICTIONS,
};
use crate::model::{EntitySet, EntityType, Property, ServiceMetadata};

/// Error reading a `$metadata` document.
#[derive(Debug, Error)]
pub enum EdmError {
    /// The document is well-formed XML but structurally incomplete.
    #[error("malformed metadata document: {0}")]
    Malformed(String),
    /// XML syntax error.
    #[error("XML error in metadata document: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Invalid XML attribute.
    #[error("invalid attribute in metadata document: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
}

/// Which restriction record an `<Annotation>` element opened.
#[derive(Clone, Copy)]
enum RestrictionKind {
    Insert,
    Update,
    Delete,
}

/// An entity type while its element is still open.
#[derive(Default)]
struct OpenType {
    name: String,
    has_stream: bool,
    key_names: Vec<String>,
    properties: Vec<Property>,
}

/// Parses a `$metadata` document into typed service metadata.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML or if a required
/// attribute (entity type name, set name, key property reference) is missing.
pub fn parse(xml: &str) -> Result<ServiceMetadata, EdmError> {
    let mut reader = Reader::from_str(xml);

    let mut metadata = ServiceMetadata::default();
    let mut open_type: Option<OpenType> = None;
    let mut open_set: Option<String> = None;
    let mut annotations_target: Option<String> = None;
    let mut open_restriction: Option<(String, RestrictionKind)> = None;

    loop {
        // Self-closing elements produce no End event, so element state is
        // only opened for Start events; Empty elements are handled whole.
        let (e, has_children) = match reader.read_event()? {
            Event::Start(e) => (e, true),
            Event::Empty(e) => (e, false),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"EntityType" => {
                        if let Some(open) = open_type.take() {
                            metadata.entity_types.push(close_type(open));
                        }
                    }
                    b"EntitySet" => open_set = None,
                    b"Annotations" => annotations_target = None,
                    b"Annotation" => open_restriction = None,
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match e.local_name().as_ref() {
            b"EntityType" => {
                let name = required_attr(&e, "Name")?;
                let has_stream = attr(&e, "HasStream")?.as_deref() == Some("true");
                let open = OpenType {
                    name,
                    has_stream,
                    ..OpenType::default()
                };
                if has_children {
                    open_type = Some(open);
                } else {
                    metadata.entity_types.push(close_type(open));
                }
            }
            b"PropertyRef" => {
                if let Some(open) = open_type.as_mut() {
                    open.key_names.push(required_attr(&e, "Name")?);
                }
            }
            b"Property" => {
                if let Some(open) = open_type.as_mut() {
                    let name = required_attr(&e, "Name")?;
                    let type_name = required_attr(&e, "Type")?;
                    open.properties.push(Property { name, type_name });
                }
            }
            b"EntitySet" => {
                let name = required_attr(&e, "Name")?;
                let entity_type = unqualified(&required_attr(&e, "EntityType")?).to_owned();
                if has_children {
                    open_set = Some(name.clone());
                }
                metadata.entity_sets.push(EntitySet { name, entity_type });
            }
            b"Annotations" => {
                // Out-of-line block: Target="NS.Container/SetName" scopes
                // the contained annotations to that entity set.
                if has_children {
                    annotations_target = attr(&e, "Target")?
                        .and_then(|t| t.rsplit_once('/').map(|(_, set)| set.to_owned()));
                }
            }
            b"Annotation" => {
                let term = attr(&e, "Term")?.unwrap_or_default();
                if term == TERM_BATCH_SUPPORTED {
                    metadata.capabilities.set_batch_supported(bool_attr(&e)?);
                } else if let Some(kind) = restriction_kind(&term) {
                    // A restriction record only arrives as child elements.
                    if has_children {
                        let target = annotations_target.clone().or_else(|| open_set.clone());
                        if let Some(set) = target {
                            open_restriction = Some((set, kind));
                        }
                    }
                }
            }
            b"PropertyValue" => {
                if let Some((set, kind)) = open_restriction.as_ref() {
                    let member = attr(&e, "Property")?.unwrap_or_default();
                    let value = bool_attr(&e)?;
                    let entry = metadata.capabilities.restriction_mut(set);
                    match (kind, member.as_str()) {
                        (RestrictionKind::Insert, "Insertable") => {
                            entry.insertable = Some(value);
                        }
                        (RestrictionKind::Update, "Updatable") => {
                            entry.updatable = Some(value);
                        }
                        (RestrictionKind::Delete, "Deletable") => {
                            entry.deletable = Some(value);
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    Ok(metadata)
}

/// Splits an open type's properties into key types and normal properties.
fn close_type(open: OpenType) -> EntityType {
    let key_types = open
        .key_names
        .iter()
        .filter_map(|key| {
            open.properties
                .iter()
                .find(|p| &p.name == key)
                .map(|p| p.type_name.clone())
        })
        .collect();
    let properties = open
        .properties
        .into_iter()
        .filter(|p| !open.key_names.contains(&p.name))
        .collect();
    EntityType {
        name: open.name,
        key_types,
        properties,
        has_stream: open.has_stream,
    }
}

fn attr(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, EdmError> {
    let Some(attribute) = e.try_get_attribute(name)? else {
        return Ok(None);
    };
    Ok(Some(attribute.unescape_value()?.into_owned()))
}

fn required_attr(e: &BytesStart<'_>, name: &str) -> Result<String, EdmError> {
    attr(e, name)?.ok_or_else(|| {
        let element = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        EdmError::Malformed(format!("<{element}> is missing the {name} attribute"))
    })
}

/// Reads a `Bool` attribute; an annotation present without one asserts true.
fn bool_attr(e: &BytesStart<'_>) -> Result<bool, EdmError> {
    Ok(attr(e, "Bool")?.as_deref() != Some("false"))
}

fn restriction_kind(term: &str) -> Option<RestrictionKind> {
    match term {
        TERM_INSERT_RESTRICTIONS => Some(RestrictionKind::Insert),
        TERM_UPDATE_RESTRICTIONS => Some(RestrictionKind::Update),
        TERM_DELETE_RESTRICTIONS => Some(RestrictionKind::Delete),
        _ => None,
    }
}

fn unqualified(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_METADATA: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx" Version="4.0">
  <edmx:DataServices>
    <Schema xmlns="http://docs.oasis-open.org/odata/ns/edm" Namespace="ODataDemo">
      <EntityType Name="Product">
        <Key>
          <PropertyRef Name="ID" />
        </Key>
        <Property Name="ID" Type="Edm.Int32" Nullable="false" />
        <Property Name="Name" Type="Edm.String" />
        <Property Name="Price" Type="Edm.Double" />
      </EntityType>
      <EntityType Name="Photo" HasStream="true">
        <Key>
          <PropertyRef Name="ID" />
        </Key>
        <Property Name="ID" Type="Edm.Int32" Nullable="false" />
        <Property Name="Caption" Type="Edm.String" />
      </EntityType>
      <EntityContainer Name="DemoService">
        <EntitySet Name="Products" EntityType="ODataDemo.Product">
          <Annotation Term="Org.OData.Capabilities.V1.InsertRestrictions">
            <Record>
              <PropertyValue Property="Insertable" Bool="true" />
            </Record>
          </Annotation>
        </EntitySet>
        <EntitySet Name="Photos" EntityType="ODataDemo.Photo" />
        <Annotation Term="Org.OData.Capabilities.V1.BatchSupported" Bool="true" />
      </EntityContainer>
      <Annotations Target="ODataDemo.DemoService/Products">
        <Annotation Term="Org.OData.Capabilities.V1.UpdateRestrictions">
          <Record>
            <PropertyValue Property="Updatable" Bool="true" />
          </Record>
        </Annotation>
        <Annotation Term="Org.OData.Capabilities.V1.DeleteRestrictions">
          <Record>
            <PropertyValue Property="Deletable" Bool="false" />
          </Record>
        </Annotation>
      </Annotations>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

    #[test]
    fn parses_entity_types_and_splits_keys() -> Result<(), EdmError> {
        let metadata = parse(DEMO_METADATA)?;

        assert_eq!(metadata.entity_types.len(), 2);
        let product = &metadata.entity_types[0];
        assert_eq!(product.name, "Product");
        assert_eq!(product.key_types, vec!["Edm.Int32".to_owned()]);
        assert!(!product.has_stream);
        // Key properties are not repeated in the normal property list.
        assert_eq!(
            product
                .properties
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Name", "Price"]
        );

        let photo = &metadata.entity_types[1];
        assert!(photo.has_stream);
        Ok(())
    }

    #[test]
    fn parses_container_sets_in_document_order() -> Result<(), EdmError> {
        let metadata = parse(DEMO_METADATA)?;
        assert_eq!(
            metadata
                .entity_sets
                .iter()
                .map(|s| (s.name.as_str(), s.entity_type.as_str()))
                .collect::<Vec<_>>(),
            vec![("Products", "Product"), ("Photos", "Photo")]
        );
        Ok(())
    }

    #[test]
    fn merges_inline_and_out_of_line_capability_annotations() -> Result<(), EdmError> {
        let metadata = parse(DEMO_METADATA)?;
        let restriction = metadata.capabilities.restriction("Products");
        assert_eq!(
            restriction.map(|r| (r.insertable, r.updatable, r.deletable)),
            Some((Some(true), Some(true), Some(false)))
        );
        assert!(metadata.capabilities.batch_supported());
        assert!(metadata.capabilities.restriction("Photos").is_none());
        Ok(())
    }

    #[test]
    fn missing_required_attribute_is_reported() {
        let result = parse(r#"<Schema><EntityType /></Schema>"#);
        assert!(matches!(result, Err(EdmError::Malformed(_))));
    }
}
