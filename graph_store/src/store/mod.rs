//! Graph Store - the in-memory directed multigraph of entities and relationships.
//!
//! Entities live in an arena of slots addressed by [`NodeHandle`]; a string
//! index maps ids to handles. Relationships live in a second arena and every
//! node keeps the handles of its outgoing and incoming edges. Removal leaves
//! tombstones behind so iteration order stays the insertion order.

mod consolidate;
mod traversal;
mod view;

pub use consolidate::*;
pub use traversal::*;
pub use view::*;

use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::entities::{strip_brackets, Entity, Properties, PERSON_TYPE};
use crate::error::StoreError;
use crate::relationships::{Relationship, RelationshipId};

/// Stable index of an entity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeHandle(usize);

/// Stable index of a relationship slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct EdgeHandle(usize);

#[derive(Debug, Clone)]
struct NodeSlot {
    entity: Entity,
    outgoing: Vec<EdgeHandle>,
    incoming: Vec<EdgeHandle>,
}

#[derive(Debug, Clone)]
struct EdgeSlot {
    relationship: Relationship,
    source: NodeHandle,
    target: NodeHandle,
}

/// The main graph structure.
///
/// Not internally synchronized: callers serialize writes, e.g. by owning the
/// store on one thread or wrapping it in a `RwLock`.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Entity arena; `None` marks a removed entity.
    nodes: Vec<Option<NodeSlot>>,

    /// Index: entity id -> slot.
    node_index: HashMap<String, NodeHandle>,

    /// Relationship arena; `None` marks a removed relationship.
    edges: Vec<Option<EdgeSlot>>,

    /// Number of live relationships.
    edge_count: usize,

    config: StoreConfig,
}

impl GraphStore {
    /// Create a new empty in-memory store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configuration this store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Add or update an entity.
    ///
    /// Person ids are bracket-normalized first (`[John]` becomes `John`), so a
    /// bracketed Person that already exists updates the existing node.
    /// Re-adding an existing `(id, type)` merges properties, replaces the
    /// description when one is given, and stamps `updated_at`.
    ///
    /// Returns `false` for an empty id or type.
    pub fn add_entity(
        &mut self,
        id: &str,
        entity_type: &str,
        properties: Option<Properties>,
        description: Option<&str>,
    ) -> bool {
        self.upsert_entity(id, entity_type, properties, description)
            .is_some()
    }

    /// Same as [`add_entity`](Self::add_entity) but returns the id the entity
    /// was stored under.
    pub fn upsert_entity(
        &mut self,
        id: &str,
        entity_type: &str,
        properties: Option<Properties>,
        description: Option<&str>,
    ) -> Option<String> {
        if entity_type.trim().is_empty() {
            warn!(id, error = %StoreError::EmptyType, "rejected entity");
            return None;
        }

        let cleaned = match self.normalize_id(id, entity_type) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                warn!(id, error = %e, "rejected entity");
                return None;
            }
        };

        let now = Utc::now();
        match self.node_index.get(&cleaned).copied() {
            Some(handle) => {
                let slot = self.nodes[handle.0].as_mut()?;
                let entity = &mut slot.entity;
                if entity.entity_type == entity_type {
                    entity.updated_at = Some(now);
                } else {
                    debug!(
                        id = %cleaned,
                        from = %entity.entity_type,
                        to = entity_type,
                        "re-typing entity"
                    );
                    entity.entity_type = entity_type.to_string();
                    entity.created_at = now;
                    entity.updated_at = None;
                }
                if let Some(properties) = properties {
                    entity.properties.extend(properties);
                }
                if let Some(description) = description {
                    entity.description = description.to_string();
                }
            }
            None => {
                let entity = Entity {
                    id: cleaned.clone(),
                    entity_type: entity_type.to_string(),
                    description: description.unwrap_or_default().to_string(),
                    properties: properties.unwrap_or_default(),
                    created_at: now,
                    updated_at: None,
                };
                self.insert_node(entity);
            }
        }

        Some(cleaned)
    }

    /// Get an entity by id.
    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.handle(id)
            .and_then(|h| self.node(h))
            .map(|slot| &slot.entity)
    }

    /// Check whether an entity exists.
    pub fn contains_entity(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Add a relationship between two existing entities.
    ///
    /// An endpoint id that is not found is retried once with its brackets
    /// stripped. Returns `false` if either endpoint cannot be resolved.
    pub fn add_relationship(
        &mut self,
        source: &str,
        target: &str,
        relation_type: &str,
        properties: Option<Properties>,
        weight: f64,
    ) -> bool {
        if source.trim().is_empty() || target.trim().is_empty() || relation_type.is_empty() {
            return false;
        }

        let (Some(source_id), Some(target_id)) =
            (self.resolve_endpoint(source), self.resolve_endpoint(target))
        else {
            debug!(source, target, relation_type, "relationship endpoint not found");
            return false;
        };

        let relationship = Relationship::new(source_id, target_id, relation_type)
            .with_weight(weight)
            .with_properties(properties.unwrap_or_default());

        self.insert_relationship(relationship).is_some()
    }

    /// Remove an entity and every relationship touching it.
    pub fn remove_entity(&mut self, id: &str) -> Option<Entity> {
        let handle = self.node_index.remove(id)?;
        let slot = self.nodes.get_mut(handle.0)?.take()?;

        for edge in slot.outgoing.iter().chain(slot.incoming.iter()) {
            let Some(edge_slot) = self.edges[edge.0].take() else {
                // Self-loops appear in both lists.
                continue;
            };
            self.edge_count -= 1;
            for endpoint in [edge_slot.source, edge_slot.target] {
                if let Some(other) = self.nodes[endpoint.0].as_mut() {
                    other.outgoing.retain(|e| e != edge);
                    other.incoming.retain(|e| e != edge);
                }
            }
        }

        debug!(id, "removed entity");
        Some(slot.entity)
    }

    /// Iterate over all entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.nodes.iter().flatten().map(|slot| &slot.entity)
    }

    /// Iterate over all relationships in insertion order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.edges.iter().flatten().map(|slot| &slot.relationship)
    }

    /// All parallel relationships from `source` to `target`.
    pub fn relationships_between<'a>(
        &'a self,
        source: &str,
        target: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> {
        self.outgoing_relationships(source)
            .into_iter()
            .filter(move |rel| rel.target_id == target)
    }

    /// Relationships leaving an entity.
    pub fn outgoing_relationships(&self, id: &str) -> Vec<&Relationship> {
        self.handle(id)
            .and_then(|h| self.node(h))
            .map(|slot| self.relationships_at(&slot.outgoing))
            .unwrap_or_default()
    }

    /// Relationships arriving at an entity.
    pub fn incoming_relationships(&self, id: &str) -> Vec<&Relationship> {
        self.handle(id)
            .and_then(|h| self.node(h))
            .map(|slot| self.relationships_at(&slot.incoming))
            .unwrap_or_default()
    }

    /// Get all entities of a specific type.
    pub fn entities_by_type(&self, entity_type: &str) -> Vec<(&str, &Entity)> {
        self.entities()
            .filter(|e| e.entity_type == entity_type)
            .map(|e| (e.id.as_str(), e))
            .collect()
    }

    /// Get the sorted set of entity types in use.
    pub fn all_types(&self) -> BTreeSet<String> {
        self.entities()
            .filter(|e| !e.entity_type.is_empty())
            .map(|e| e.entity_type.clone())
            .collect()
    }

    /// Case-insensitive substring search over ids and descriptions.
    pub fn text_search(&self, query: &str) -> Vec<(&str, &Entity)> {
        let needle = query.to_lowercase();
        self.entities()
            .filter(|e| {
                e.id.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .map(|e| (e.id.as_str(), e))
            .collect()
    }

    /// Get the total number of entities.
    pub fn entity_count(&self) -> usize {
        self.node_index.len()
    }

    /// Get the total number of relationships.
    pub fn relationship_count(&self) -> usize {
        self.edge_count
    }

    /// Entity and relationship counts.
    pub fn statistics(&self) -> GraphStatistics {
        GraphStatistics {
            entity_count: self.entity_count(),
            relationship_count: self.relationship_count(),
        }
    }

    /// Remove everything, keeping the configuration.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.node_index.clear();
        self.edges.clear();
        self.edge_count = 0;
    }

    /// Insert a fully-formed entity, replacing any entity with the same id.
    /// Relationships of a replaced entity are kept.
    pub(crate) fn insert_node(&mut self, entity: Entity) {
        if let Some(handle) = self.node_index.get(&entity.id).copied() {
            if let Some(slot) = self.nodes[handle.0].as_mut() {
                slot.entity = entity;
                return;
            }
        }

        let handle = NodeHandle(self.nodes.len());
        self.node_index.insert(entity.id.clone(), handle);
        self.nodes.push(Some(NodeSlot {
            entity,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }));
    }

    /// Insert a fully-formed relationship whose endpoint ids are exact.
    pub(crate) fn insert_relationship(&mut self, relationship: Relationship) -> Option<RelationshipId> {
        let source = self.handle(&relationship.source_id)?;
        let target = self.handle(&relationship.target_id)?;
        let id = relationship.id;

        let handle = EdgeHandle(self.edges.len());
        self.edges.push(Some(EdgeSlot {
            relationship,
            source,
            target,
        }));
        self.edge_count += 1;

        if let Some(slot) = self.nodes[source.0].as_mut() {
            slot.outgoing.push(handle);
        }
        if let Some(slot) = self.nodes[target.0].as_mut() {
            slot.incoming.push(handle);
        }

        Some(id)
    }

    fn normalize_id(&self, id: &str, entity_type: &str) -> Result<String, StoreError> {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyId);
        }
        if entity_type != PERSON_TYPE {
            return Ok(trimmed.to_string());
        }

        let cleaned = strip_brackets(trimmed);
        if cleaned.is_empty() {
            return Err(StoreError::EmptyId);
        }
        if cleaned != trimmed {
            warn!(original = trimmed, cleaned, "removed brackets from Person entity id");
            if self.get_entity(cleaned).is_some_and(Entity::is_person) {
                info!(id = cleaned, "using existing Person entity instead of a bracketed duplicate");
            }
        }
        Ok(cleaned.to_string())
    }

    fn resolve_endpoint(&self, id: &str) -> Option<String> {
        let trimmed = id.trim();
        if self.contains_entity(trimmed) {
            return Some(trimmed.to_string());
        }

        let cleaned = strip_brackets(trimmed);
        if cleaned != trimmed && self.contains_entity(cleaned) {
            info!(original = trimmed, cleaned, "resolved relationship endpoint without brackets");
            return Some(cleaned.to_string());
        }
        None
    }

    fn handle(&self, id: &str) -> Option<NodeHandle> {
        self.node_index.get(id).copied()
    }

    fn node(&self, handle: NodeHandle) -> Option<&NodeSlot> {
        self.nodes.get(handle.0).and_then(Option::as_ref)
    }

    fn edge(&self, handle: EdgeHandle) -> Option<&EdgeSlot> {
        self.edges.get(handle.0).and_then(Option::as_ref)
    }

    fn id_of(&self, handle: NodeHandle) -> &str {
        self.node(handle)
            .map(|slot| slot.entity.id.as_str())
            .unwrap_or_default()
    }

    fn relationships_at(&self, handles: &[EdgeHandle]) -> Vec<&Relationship> {
        handles
            .iter()
            .filter_map(|h| self.edge(*h))
            .map(|slot| &slot.relationship)
            .collect()
    }
}
