//! Example-value synthesis for probe payloads.
//!
//! Rules that create or update entities need well-formed property values
//! without knowing anything about the service's data. Values are derived
//! deterministically from the property name so repeated runs produce
//! identical payloads.

use serde_json::{json, Map, Value};

use odata_edm::{EntityType, Property};

/// Builds an insert document for `entity_type`.
///
/// Covers the type's normal properties; key values are left to the service
/// to generate. Properties of unrecognized EDM types are skipped.
#[must_use]
pub fn insert_payload(entity_type: &EntityType) -> Value {
    let mut document = Map::new();
    for property in &entity_type.properties {
        if let Some(value) = example_value(&property.type_name, &property.name, "insert") {
            document.insert(property.name.clone(), value);
        }
    }
    Value::Object(document)
}

/// Builds an update document replacing the values of `properties`.
///
/// Only properties actually present on the fetched entity are included, so
/// the PATCH never introduces properties the service did not return.
#[must_use]
pub fn update_payload(entity: &Value, properties: &[&Property]) -> Value {
    let mut document = Map::new();
    for property in properties {
        if entity.get(&property.name).is_none() {
            continue;
        }
        if let Some(value) = example_value(&property.type_name, &property.name, "update") {
            document.insert(property.name.clone(), value);
        }
    }
    Value::Object(document)
}

/// Returns a well-formed example value for an EDM primitive type, or `None`
/// for types the synthesizer does not model (streams, spatial types, ...).
fn example_value(type_name: &str, property_name: &str, phase: &str) -> Option<Value> {
    match type_name {
        "Edm.String" => Some(json!(format!("{property_name}-{phase}"))),
        "Edm.Int16" | "Edm.Int32" | "Edm.Int64" | "Edm.Byte" | "Edm.SByte" => {
            // Distinct insert/update values so a PATCH is always a real change.
            Some(json!(if phase == "insert" { 21 } else { 42 }))
        }
        "Edm.Single" | "Edm.Double" | "Edm.Decimal" => Some(json!(1.5)),
        "Edm.Boolean" => Some(json!(phase == "insert")),
        "Edm.Guid" => Some(json!("c7f4a716-2f71-4f54-9d4e-cbd4b2d5c1a6")),
        "Edm.DateTimeOffset" => Some(json!("2014-06-26T00:00:00Z")),
        "Edm.Date" => Some(json!("2014-06-26")),
        "Edm.TimeOfDay" => Some(json!("12:00:00")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_property(name: &str) -> Property {
        Property {
            name: name.to_owned(),
            type_name: "Edm.String".to_owned(),
        }
    }

    #[test]
    fn insert_document_covers_known_types_and_skips_unknown() {
        let entity_type = EntityType {
            name: "Product".to_owned(),
            key_types: vec!["Edm.Int32".to_owned()],
            properties: vec![
                string_property("Name"),
                Property {
                    name: "Location".to_owned(),
                    type_name: "Edm.GeographyPoint".to_owned(),
                },
            ],
            has_stream: false,
        };

        let document = insert_payload(&entity_type);
        assert_eq!(document.get("Name"), Some(&json!("Name-insert")));
        assert!(document.get("Location").is_none());
    }

    #[test]
    fn update_document_only_touches_properties_the_entity_returned() {
        let name = string_property("Name");
        let missing = string_property("Nickname");
        let entity = json!({"Name": "old", "ID": 7});

        let document = update_payload(&entity, &[&name, &missing]);
        assert_eq!(document.get("Name"), Some(&json!("Name-update")));
        assert!(document.get("Nickname").is_none());
    }

    #[test]
    fn update_value_differs_from_insert_value() {
        let insert = example_value("Edm.String", "Name", "insert");
        let update = example_value("Edm.String", "Name", "update");
        assert_ne!(insert, update);
    }
}
