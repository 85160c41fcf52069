//! Relationship definitions - typed, directed, weighted edges between entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{Properties, PropertyValue};

/// Default edge weight.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Unique identifier for relationships.
///
/// Parallel edges between the same ordered pair are told apart by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipId(pub Uuid);

impl RelationshipId {
    /// Create a new random relationship ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RelationshipId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A directed edge between two entity ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub id: RelationshipId,

    pub source_id: String,

    pub target_id: String,

    #[serde(rename = "type")]
    pub relation_type: String,

    #[serde(default = "default_weight")]
    pub weight: f64,

    #[serde(default)]
    pub properties: Properties,

    pub created_at: DateTime<Utc>,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

impl Relationship {
    /// Create a new relationship with default weight and no properties.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            id: RelationshipId::new(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type: relation_type.into(),
            weight: DEFAULT_WEIGHT,
            properties: Properties::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
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

    /// Check whether the relation type is one of `types`.
    pub fn has_type_in(&self, types: &[String]) -> bool {
        types.iter().any(|t| *t == self.relation_type)
    }

    /// Check whether this edge starts and ends at the same entity.
    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }
}
