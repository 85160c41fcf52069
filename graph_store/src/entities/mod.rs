//! Entity definitions for the knowledge graph.

mod property;

pub use property::*;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Entity type that receives bracket normalization and dedup-by-id.
pub const PERSON_TYPE: &str = "Person";

/// Attribute names that are not part of an entity's property map.
pub const RESERVED_ATTRIBUTES: [&str; 4] = ["type", "description", "created_at", "updated_at"];

/// A typed node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique, case-sensitive primary key.
    pub id: String,

    #[serde(rename = "type")]
    pub entity_type: String,

    /// Free text used for search and semantic similarity.
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub properties: Properties,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Create a new entity with the given id and type.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            description: String::new(),
            properties: Properties::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set a single property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Merge a set of properties (new values win).
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Check whether this entity is a Person.
    pub fn is_person(&self) -> bool {
        self.entity_type == PERSON_TYPE
    }

    /// Description if present, otherwise the id. This is the text that gets
    /// embedded for semantic comparisons.
    pub fn embedding_text(&self) -> &str {
        if self.description.is_empty() {
            &self.id
        } else {
            &self.description
        }
    }

    /// Flat attribute lookup: reserved attributes first, then properties.
    pub fn attribute(&self, field: &str) -> Option<PropertyValue> {
        match field {
            "type" => Some(PropertyValue::String(self.entity_type.clone())),
            "description" => Some(PropertyValue::String(self.description.clone())),
            "created_at" => Some(PropertyValue::String(format_timestamp(&self.created_at))),
            "updated_at" => self
                .updated_at
                .as_ref()
                .map(|t| PropertyValue::String(format_timestamp(t))),
            _ => self.properties.get(field).cloned(),
        }
    }
}

/// Render a timestamp the way it appears in attribute lookups and results.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Strip symmetric bracket wrapping (`[x]`, `[[x]]`, ...) and surrounding
/// whitespace from an id.
pub fn strip_brackets(id: &str) -> &str {
    let mut cleaned = id.trim();
    while cleaned.len() >= 2 && cleaned.starts_with('[') && cleaned.ends_with(']') {
        cleaned = cleaned[1..cleaned.len() - 1].trim();
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity() {
        let entity = Entity::new("John", "Person")
            .with_description("An engineer")
            .with_property("age", 41);

        assert_eq!(entity.id, "John");
        assert!(entity.is_person());
        assert!(entity.updated_at.is_none());
        assert_eq!(entity.properties["age"], PropertyValue::Integer(41));
    }

    #[test]
    fn test_strip_brackets() {
        assert_eq!(strip_brackets("[John]"), "John");
        assert_eq!(strip_brackets("[[ John ]]"), "John");
        assert_eq!(strip_brackets("  John  "), "John");
        assert_eq!(strip_brackets("[John"), "[John");
        assert_eq!(strip_brackets("[]"), "");
    }

    #[test]
    fn test_attribute_lookup() {
        let entity = Entity::new("Acme", "Organization")
            .with_description("Widgets")
            .with_property("size", 512);

        assert_eq!(entity.attribute("type"), Some(PropertyValue::from("Organization")));
        assert_eq!(entity.attribute("description"), Some(PropertyValue::from("Widgets")));
        assert_eq!(entity.attribute("size"), Some(PropertyValue::Integer(512)));
        assert!(entity.attribute("updated_at").is_none());
        assert!(entity.attribute("missing").is_none());

        let created = entity.attribute("created_at").unwrap();
        assert!(created.as_text().contains('T'));
    }

    #[test]
    fn test_embedding_text_falls_back_to_id() {
        let bare = Entity::new("Acme", "Organization");
        assert_eq!(bare.embedding_text(), "Acme");

        let described = bare.with_description("A widget maker");
        assert_eq!(described.embedding_text(), "A widget maker");
    }

    #[test]
    fn test_entity_serde_uses_type_key() {
        let entity = Entity::new("John", "Person");
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "Person");
        assert!(json.get("updated_at").is_none());

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);
    }
}
