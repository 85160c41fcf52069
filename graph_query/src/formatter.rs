//! Result formatting - node rows, edge rows and the response envelope.

use graph_store::{Entity, GraphStore, Relationship};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// One result row, e.g. `{"name": "John", "type": "Person"}`.
pub type Row = Map<String, Value>;

/// Payload of a connectivity-expansion query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<Row>,
    pub edges: Vec<Row>,
    pub starting_nodes: Vec<String>,
    pub connected_nodes: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Results of a successful query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResults {
    Rows(Vec<Row>),
    Subgraph(Subgraph),
}

impl QueryResults {
    /// Number of rows, or 1 for a subgraph payload.
    pub fn result_count(&self) -> usize {
        match self {
            QueryResults::Rows(rows) => rows.len(),
            QueryResults::Subgraph(_) => 1,
        }
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            QueryResults::Rows(rows) => Some(rows),
            QueryResults::Subgraph(_) => None,
        }
    }

    pub fn subgraph(&self) -> Option<&Subgraph> {
        match self {
            QueryResults::Subgraph(subgraph) => Some(subgraph),
            QueryResults::Rows(_) => None,
        }
    }
}

/// The envelope returned for every executed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub success: bool,
    pub query_name: String,
    pub query_type: String,
    /// Elapsed seconds, rounded.
    pub execution_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<QueryResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Builds rows and envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultFormatter {
    time_precision: u32,
}

impl ResultFormatter {
    /// Create a formatter that keeps `time_precision` decimals of elapsed
    /// seconds.
    pub fn new(time_precision: u32) -> Self {
        Self { time_precision }
    }

    /// Format one entity as `{name, <field>...}`.
    ///
    /// `properties` yields the whole property map; unknown fields are null.
    pub fn format_node(entity: &Entity, fields: &[String]) -> Row {
        let mut row = Row::new();
        row.insert("name".to_string(), Value::String(entity.id.clone()));

        for field in fields.iter().filter(|f| f.as_str() != "name") {
            let value = match field.as_str() {
                "properties" => Value::Object(
                    entity
                        .properties
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect(),
                ),
                other => entity
                    .attribute(other)
                    .map(|v| v.to_json())
                    .unwrap_or(Value::Null),
            };
            row.insert(field.clone(), value);
        }
        row
    }

    /// Format the entities named by `ids`, skipping unknown ids.
    pub fn format_node_results(store: &GraphStore, ids: &[String], fields: &[String]) -> Vec<Row> {
        ids.iter()
            .filter_map(|id| store.get_entity(id))
            .map(|entity| Self::format_node(entity, fields))
            .collect()
    }

    /// Format an edge as `{source, target, type, weight, properties?}`.
    pub fn format_edge(relationship: &Relationship) -> Row {
        let mut row = Row::new();
        row.insert("source".to_string(), Value::String(relationship.source_id.clone()));
        row.insert("target".to_string(), Value::String(relationship.target_id.clone()));
        row.insert("type".to_string(), Value::String(relationship.relation_type.clone()));
        row.insert("weight".to_string(), Value::from(relationship.weight));
        if !relationship.properties.is_empty() {
            let properties = relationship
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect();
            row.insert("properties".to_string(), Value::Object(properties));
        }
        row
    }

    /// Build the response envelope. Failures carry `error` and no results.
    pub fn format_query_response(
        &self,
        success: bool,
        query_name: &str,
        query_type: &str,
        results: Option<QueryResults>,
        elapsed: Duration,
        error: Option<String>,
    ) -> QueryResponse {
        let execution_time = round_to(elapsed.as_secs_f64(), self.time_precision);
        let (results, error) = if success { (results, None) } else { (None, error) };

        QueryResponse {
            success,
            query_name: query_name.to_string(),
            query_type: query_type.to_string(),
            execution_time,
            result_count: results.as_ref().map(QueryResults::result_count),
            results,
            error,
        }
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(4)
    }
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places.min(15) as i32);
    (value * factor).round() / factor
}
