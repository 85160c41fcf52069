//! Query parser - turns query text into a [`ParsedQuery`].
//!
//! Query text is YAML with two levels of nesting:
//!
//! ```yaml
//! engineers:            # query name
//!   find:               # query kind
//!     nodes:
//!       type: Person
//!     return: [name, type]
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::{QueryError, Result};

/// The discriminator directly below the query name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Node query that must carry a `nodes` clause.
    Find,
    /// Node query; the definition itself may hold the node clauses.
    FindNodes,
    /// Shortest-path query.
    FindPath,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Find => "find",
            QueryKind::FindNodes => "find_nodes",
            QueryKind::FindPath => "find_path",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "find" => Ok(QueryKind::Find),
            "find_nodes" => Ok(QueryKind::FindNodes),
            "find_path" => Ok(QueryKind::FindPath),
            _ => Err(()),
        }
    }
}

/// A query split into name, kind and clause map.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub name: String,
    pub kind: QueryKind,
    pub definition: Map<String, Value>,
}

impl ParsedQuery {
    /// The node clauses: `definition.nodes` when it is a mapping, otherwise
    /// the definition itself.
    pub fn nodes_definition(&self) -> &Map<String, Value> {
        extract_nodes_definition(&self.definition)
    }
}

/// Parse query text.
///
/// The first key of the document is the query name and the first key below
/// it is the kind. Unknown kinds are rejected here, before compilation.
pub fn parse(text: &str) -> Result<ParsedQuery> {
    let document: Value =
        serde_yaml::from_str(text).map_err(|e| QueryError::Format(e.to_string()))?;

    let Value::Object(document) = document else {
        return Err(QueryError::Format("query must be a mapping".to_string()));
    };
    let Some((name, spec)) = document.into_iter().next() else {
        return Err(QueryError::Format("query is empty".to_string()));
    };

    let Value::Object(spec) = spec else {
        return Err(QueryError::Format(format!(
            "query '{name}' must map a query type to its definition"
        )));
    };
    let Some((kind, definition)) = spec.into_iter().next() else {
        return Err(QueryError::Format(format!("query '{name}' has no query type")));
    };

    let Ok(kind) = kind.parse::<QueryKind>() else {
        return Err(QueryError::UnsupportedQueryKind { name, kind });
    };

    let Value::Object(definition) = definition else {
        return Err(QueryError::Format(format!(
            "definition of '{name}' ({kind}) must be a mapping"
        )));
    };

    debug!(query = %name, %kind, "parsed query");
    Ok(ParsedQuery {
        name,
        kind,
        definition,
    })
}

/// `definition.nodes` when it is a mapping, otherwise `definition`.
pub fn extract_nodes_definition(definition: &Map<String, Value>) -> &Map<String, Value> {
    match definition.get("nodes") {
        Some(Value::Object(nodes)) => nodes,
        _ => definition,
    }
}

/// Fields to return: the node clauses' `return`, else the definition's
/// `return`, else `default`. A single string names one field.
pub fn extract_return_fields(
    nodes: &Map<String, Value>,
    definition: &Map<String, Value>,
    default: &[String],
) -> Vec<String> {
    let spec = nodes.get("return").or_else(|| definition.get("return"));
    match spec {
        Some(Value::Array(fields)) => fields
            .iter()
            .filter_map(|f| f.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(field)) => vec![field.clone()],
        _ => default.to_vec(),
    }
}
