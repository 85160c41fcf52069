//! Filter stages - each maps an ordered candidate id list to the subset
//! that passes, preserving order.

mod semantic;

pub use semantic::*;

use graph_store::{Direction, Entity, GraphStore};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::condition::{Condition, FieldCondition, FieldMatch, FieldSpec};

/// `properties` clause.
///
/// Each key contributes one clause: a scalar demands loose equality, a
/// mapping of operators passes when any one of them holds. Every clause must
/// pass.
#[derive(Debug, Clone)]
pub struct PropertyFilter {
    clauses: Vec<Vec<FieldCondition>>,
}

impl PropertyFilter {
    pub fn from_map(spec: &Map<String, Value>) -> Self {
        Self {
            clauses: spec
                .iter()
                .map(|(field, value)| FieldCondition::from_entry(field, value))
                .collect(),
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.clauses
            .iter()
            .all(|alternatives| alternatives.iter().any(|c| c.evaluate(entity)))
    }
}

/// `filter` clause: every entry must match its attribute.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    fields: Vec<FieldSpec>,
}

impl FilterSpec {
    pub fn from_map(spec: &Map<String, Value>) -> Self {
        Self {
            fields: spec
                .iter()
                .map(|(field, entry)| FieldSpec::new(field.as_str(), FieldMatch::from_filter_entry(entry)))
                .collect(),
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.fields.iter().all(|f| f.evaluate(entity))
    }
}

/// `connected_to` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityFilter {
    /// Anchor entity; `None` disables the filter.
    pub entity: Option<String>,
    pub max_depth: usize,
    /// Relation types to follow (`via`); `None` follows all.
    pub via: Option<Vec<String>>,
}

/// Keep candidates of the given type.
pub fn by_type(store: &GraphStore, candidates: Vec<String>, entity_type: &str) -> Vec<String> {
    retain_entities(store, candidates, |e| e.entity_type == entity_type)
}

/// Keep only the candidate whose id is exactly `name`.
pub fn by_name(candidates: Vec<String>, name: &str) -> Vec<String> {
    candidates.into_iter().filter(|id| id == name).collect()
}

/// Apply a [`PropertyFilter`].
pub fn by_properties(store: &GraphStore, candidates: Vec<String>, filter: &PropertyFilter) -> Vec<String> {
    retain_entities(store, candidates, |e| filter.matches(e))
}

/// Apply a single field-spec matcher, e.g. `description: {contains: ...}`.
pub fn by_field_spec(store: &GraphStore, candidates: Vec<String>, spec: &FieldSpec) -> Vec<String> {
    retain_entities(store, candidates, |e| spec.evaluate(e))
}

/// Apply a `filter` clause.
pub fn by_filter_spec(store: &GraphStore, candidates: Vec<String>, spec: &FilterSpec) -> Vec<String> {
    retain_entities(store, candidates, |e| spec.matches(e))
}

/// Apply a `where` condition.
pub fn by_condition(store: &GraphStore, candidates: Vec<String>, condition: &Condition) -> Vec<String> {
    retain_entities(store, candidates, |e| condition.evaluate(e))
}

/// Keep candidates reachable from the anchor entity within `max_depth`
/// hops in either direction. Without an anchor the candidates pass through.
pub fn by_connectivity(
    store: &GraphStore,
    candidates: Vec<String>,
    filter: &ConnectivityFilter,
) -> Vec<String> {
    let Some(anchor) = filter.entity.as_deref() else {
        return candidates;
    };

    let reachable: HashSet<String> = store
        .find_connected(anchor, filter.max_depth, filter.via.as_deref(), Direction::Both)
        .into_iter()
        .collect();

    candidates
        .into_iter()
        .filter(|id| reachable.contains(id))
        .collect()
}

fn retain_entities<F>(store: &GraphStore, candidates: Vec<String>, mut keep: F) -> Vec<String>
where
    F: FnMut(&Entity) -> bool,
{
    candidates
        .into_iter()
        .filter(|id| store.get_entity(id).is_some_and(&mut keep))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_store::Properties;
    use serde_json::json;

    fn files() -> GraphStore {
        let mut store = GraphStore::new();
        for (id, date, size) in [
            ("a.txt", "2025-07-09", 512),
            ("b.txt", "2025-07-11", 2048),
            ("c.txt", "2025-07-12", 1024),
        ] {
            let props: Properties = [
                ("created_date".to_string(), date.into()),
                ("size".to_string(), size.into()),
            ]
            .into_iter()
            .collect();
            store.add_entity(id, "File", Some(props), Some("plain text file"));
        }
        store.add_entity("docs", "Folder", None, None);
        store
    }

    fn ids(store: &GraphStore) -> Vec<String> {
        store.entities().map(|e| e.id.clone()).collect()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_by_type_and_name() {
        let store = files();
        let files = by_type(&store, ids(&store), "File");
        assert_eq!(files, vec!["a.txt", "b.txt", "c.txt"]);
        assert_eq!(by_name(files, "b.txt"), vec!["b.txt"]);
    }

    #[test]
    fn test_property_operator_on_dates() {
        let store = files();
        let filter = PropertyFilter::from_map(&object(json!({"created_date": {"gt": "2025-07-10"}})));
        assert_eq!(by_properties(&store, ids(&store), &filter), vec!["b.txt", "c.txt"]);
    }

    #[test]
    fn test_property_operators_are_alternatives() {
        let store = files();
        let filter = PropertyFilter::from_map(&object(json!({
            "size": {"lt": 600, "gt": 2000},
            "created_date": {"startswith": "2025-07"}
        })));
        assert_eq!(by_properties(&store, ids(&store), &filter), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_filter_spec() {
        let store = files();
        let spec = FilterSpec::from_map(&object(json!({"description": "TEXT", "created_date": {"regex": "-1[12]$"}})));
        assert_eq!(by_filter_spec(&store, ids(&store), &spec), vec!["b.txt", "c.txt"]);
    }

    #[test]
    fn test_where_condition() {
        let store = files();
        let condition = Condition::from_value(&json!({"any": ["size >= 2048", "size < 600"]}));
        assert_eq!(by_condition(&store, ids(&store), &condition), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_connectivity() {
        let mut store = files();
        store.add_relationship("docs", "a.txt", "contains", None, 1.0);
        store.add_relationship("c.txt", "docs", "backup_of", None, 1.0);

        let filter = ConnectivityFilter {
            entity: Some("docs".to_string()),
            max_depth: 1,
            via: Some(vec!["contains".to_string()]),
        };
        assert_eq!(by_connectivity(&store, ids(&store), &filter), vec!["a.txt"]);

        let all = ConnectivityFilter { via: None, ..filter.clone() };
        assert_eq!(by_connectivity(&store, ids(&store), &all), vec!["a.txt", "c.txt"]);

        let disabled = ConnectivityFilter { entity: None, ..filter };
        assert_eq!(by_connectivity(&store, ids(&store), &disabled).len(), 4);
    }
}
