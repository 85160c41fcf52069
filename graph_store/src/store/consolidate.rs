//! Entity consolidation - merging several entities into one.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::GraphStore;
use crate::entities::Properties;
use crate::error::{Result, StoreError};
use crate::relationships::Relationship;

/// Outcome of [`GraphStore::consolidate_entities`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    /// Id the consolidated entity is stored under.
    pub target_entity: String,
    /// Source entities that were removed.
    pub consolidated_from: Vec<String>,
    /// Relationships re-created against the target.
    pub relationships_updated: usize,
}

impl GraphStore {
    /// Merge `sources` into a single `target` entity.
    ///
    /// 1. Create or update `target`. Explicit `properties` win over source
    ///    properties; among sources the first value seen for a key wins. The
    ///    description is `description` if given, else the source descriptions
    ///    joined with `" | "`.
    /// 2. Re-create every incoming and outgoing edge of each source against
    ///    `target`, skipping edges whose other end is `target`.
    /// 3. Remove the sources (a source equal to `target` is kept).
    pub fn consolidate_entities(
        &mut self,
        sources: &[String],
        target: &str,
        entity_type: &str,
        properties: Option<Properties>,
        description: Option<&str>,
    ) -> Result<ConsolidationReport> {
        if sources.is_empty() || target.trim().is_empty() {
            return Err(StoreError::EmptyId);
        }
        if entity_type.trim().is_empty() {
            return Err(StoreError::EmptyType);
        }

        let missing: Vec<String> = sources
            .iter()
            .filter(|id| !self.contains_entity(id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::EntityNotFound(missing));
        }

        let mut merged = properties.unwrap_or_default();
        let mut descriptions = Vec::new();
        for entity in sources.iter().filter_map(|id| self.get_entity(id)) {
            for (key, value) in &entity.properties {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
            if !entity.description.is_empty() {
                descriptions.push(entity.description.clone());
            }
        }

        let description = description
            .map(str::to_string)
            .or_else(|| (!descriptions.is_empty()).then(|| descriptions.join(" | ")));

        let target_id = self
            .upsert_entity(target, entity_type, Some(merged), description.as_deref())
            .ok_or(StoreError::EmptyId)?;

        let mut relationships_updated = 0;
        for source in sources.iter().filter(|id| **id != target_id) {
            let incoming: Vec<Relationship> =
                self.incoming_relationships(source).into_iter().cloned().collect();
            for rel in incoming.into_iter().filter(|r| r.source_id != target_id) {
                if self.add_relationship(
                    &rel.source_id,
                    &target_id,
                    &rel.relation_type,
                    Some(rel.properties),
                    rel.weight,
                ) {
                    relationships_updated += 1;
                }
            }

            let outgoing: Vec<Relationship> =
                self.outgoing_relationships(source).into_iter().cloned().collect();
            for rel in outgoing.into_iter().filter(|r| r.target_id != target_id) {
                if self.add_relationship(
                    &target_id,
                    &rel.target_id,
                    &rel.relation_type,
                    Some(rel.properties),
                    rel.weight,
                ) {
                    relationships_updated += 1;
                }
            }
        }

        let mut consolidated_from = Vec::new();
        for source in sources.iter().filter(|id| **id != target_id) {
            if self.remove_entity(source).is_some() {
                consolidated_from.push(source.clone());
            }
        }

        info!(
            target = %target_id,
            removed = consolidated_from.len(),
            relationships_updated,
            "consolidated entities"
        );

        Ok(ConsolidationReport {
            target_entity: target_id,
            consolidated_from,
            relationships_updated,
        })
    }
}
