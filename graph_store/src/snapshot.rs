//! JSON snapshots of the whole graph.
//!
//! A snapshot is `{"version": 1, "entities": [...], "relationships": [...]}`.
//! Entities are written before relationships so a reload can resolve every
//! edge endpoint.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::entities::Entity;
use crate::error::{Result, StoreError};
use crate::relationships::Relationship;
use crate::store::GraphStore;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a [`GraphStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl GraphStore {
    /// Open the store described by `config`, loading its snapshot when the
    /// file exists and starting empty otherwise.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let mut store = GraphStore::with_config(config);
        if store.config().snapshot_path.exists() {
            store.load()?;
        } else {
            info!(
                path = %store.config().snapshot_path.display(),
                "no snapshot found, starting with an empty graph"
            );
        }
        Ok(store)
    }

    /// Write the snapshot to the configured path.
    pub fn save(&self) -> Result<()> {
        let path = self.config().snapshot_path.clone();
        self.save_to(path)
    }

    /// Write the snapshot to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let snapshot = self.to_snapshot();
        let text = if self.config().pretty_snapshots {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        fs::write(path, text).map_err(|e| StoreError::io(path, e))?;

        info!(
            path = %path.display(),
            entities = snapshot.entities.len(),
            relationships = snapshot.relationships.len(),
            "saved graph snapshot"
        );
        Ok(())
    }

    /// Replace the graph contents with the configured snapshot.
    pub fn load(&mut self) -> Result<()> {
        let path = self.config().snapshot_path.clone();
        self.load_from(path)
    }

    /// Replace the graph contents with the snapshot at `path`.
    ///
    /// On error the current contents are left untouched.
    pub fn load_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let snapshot: Snapshot = serde_json::from_str(&text)?;
        self.restore(snapshot)?;

        info!(
            path = %path.display(),
            entities = self.entity_count(),
            relationships = self.relationship_count(),
            "loaded graph snapshot"
        );
        Ok(())
    }

    /// Capture the current graph.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            entities: self.entities().cloned().collect(),
            relationships: self.relationships().cloned().collect(),
        }
    }

    /// Build a store from a snapshot using the default configuration.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut store = GraphStore::new();
        store.restore(snapshot)?;
        Ok(store)
    }

    fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        self.clear();
        for entity in snapshot.entities {
            self.insert_node(entity);
        }
        for relationship in snapshot.relationships {
            let (source, target) = (relationship.source_id.clone(), relationship.target_id.clone());
            if self.insert_relationship(relationship).is_none() {
                warn!(%source, %target, "skipping snapshot relationship with a missing endpoint");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_shape() {
        let mut store = GraphStore::new();
        store.add_entity("John", "Person", None, Some("Engineer"));
        store.add_entity("Acme", "Organization", None, None);
        store.add_relationship("John", "Acme", "works_at", None, 0.8);

        let json = serde_json::to_value(store.to_snapshot()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["entities"][0]["id"], "John");
        assert_eq!(json["entities"][0]["type"], "Person");
        assert_eq!(json["relationships"][0]["type"], "works_at");
        assert_eq!(json["relationships"][0]["weight"], 0.8);
    }

    #[test]
    fn test_from_snapshot_skips_dangling_edges() {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entities: vec![Entity::new("A", "Node"), Entity::new("B", "Node")],
            relationships: vec![
                Relationship::new("A", "B", "rel"),
                Relationship::new("A", "Ghost", "rel"),
            ],
        };

        let store = GraphStore::from_snapshot(snapshot).unwrap();
        assert_eq!(store.entity_count(), 2);
        assert_eq!(store.relationship_count(), 1);
    }

    #[test]
    fn test_version_mismatch() {
        let snapshot = Snapshot {
            version: 7,
            entities: Vec::new(),
            relationships: Vec::new(),
        };

        assert!(matches!(
            GraphStore::from_snapshot(snapshot),
            Err(StoreError::SnapshotVersion { found: 7, expected: 1 })
        ));
    }
}
