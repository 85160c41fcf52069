//! Read-only projections of the store.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::GraphStore;
use crate::entities::Entity;
use crate::relationships::Relationship;

/// Basic counts about the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub entity_count: usize,
    pub relationship_count: usize,
}

/// An induced subgraph: the requested nodes plus every edge whose endpoints
/// are both among them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<Entity>,
    pub edges: Vec<Relationship>,
}

impl GraphView {
    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check whether the view contains a node.
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}

impl GraphStore {
    /// Project the subgraph induced by `ids`. Unknown ids are ignored; nodes
    /// and edges keep store order.
    pub fn induced_subgraph<S: AsRef<str>>(&self, ids: &[S]) -> GraphView {
        let members: HashSet<&str> = ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| self.contains_entity(id))
            .collect();

        let nodes = self
            .entities()
            .filter(|e| members.contains(e.id.as_str()))
            .cloned()
            .collect();

        let edges = self
            .relationships()
            .filter(|r| {
                members.contains(r.source_id.as_str()) && members.contains(r.target_id.as_str())
            })
            .cloned()
            .collect();

        GraphView { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_induced_subgraph() {
        let mut store = GraphStore::new();
        for id in ["A", "B", "C"] {
            store.add_entity(id, "Node", None, None);
        }
        store.add_relationship("A", "B", "rel", None, 1.0);
        store.add_relationship("B", "A", "back", None, 1.0);
        store.add_relationship("B", "C", "rel", None, 1.0);

        let view = store.induced_subgraph(&["B", "A", "Z"]);

        assert_eq!(view.node_count(), 2);
        assert_eq!(view.nodes[0].id, "A");
        assert!(view.contains_node("B"));
        assert!(!view.contains_node("C"));
        assert_eq!(view.edge_count(), 2);
        assert!(view.edges.iter().all(|e| e.target_id != "C"));
    }

    #[test]
    fn test_statistics() {
        let mut store = GraphStore::new();
        store.add_entity("A", "Node", None, None);
        store.add_entity("B", "Node", None, None);
        store.add_relationship("A", "B", "rel", None, 1.0);

        assert_eq!(
            store.statistics(),
            GraphStatistics {
                entity_count: 2,
                relationship_count: 1
            }
        );
    }
}
