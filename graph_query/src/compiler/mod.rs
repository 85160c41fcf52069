//! Query compiler - turns a [`ParsedQuery`] into a [`CompiledQuery`] that
//! can be executed against a store.
//!
//! Compilation validates clauses and builds typed plans once; execution
//! interprets the plan against whatever the store holds at that moment.

mod nodes;
mod paths;
mod sort;

pub use nodes::*;
pub use paths::*;
pub use sort::*;

use graph_store::GraphStore;
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{QueryError, Result};
use crate::formatter::{QueryResults, Row};
use crate::parser::{ParsedQuery, QueryKind};

/// Borrowed state a compiled query runs against.
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub store: &'a GraphStore,
    pub provider: Option<&'a dyn EmbeddingProvider>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(store: &'a GraphStore, provider: Option<&'a dyn EmbeddingProvider>) -> Self {
        Self { store, provider }
    }
}

/// The executable part of a compiled query.
#[derive(Debug, Clone)]
pub enum QueryPlan {
    Nodes(NodePlan),
    Path(PathPlan),
}

/// A validated query, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub name: String,
    pub kind: QueryKind,
    pub plan: QueryPlan,
}

impl CompiledQuery {
    /// Run the query against the current store contents.
    pub fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<QueryResults> {
        match &self.plan {
            QueryPlan::Nodes(plan) => Ok(plan.execute(ctx)),
            QueryPlan::Path(plan) => plan.execute(ctx),
        }
    }
}

/// Compile a parsed query.
pub fn compile(parsed: &ParsedQuery, config: &EngineConfig) -> Result<CompiledQuery> {
    let plan = match parsed.kind {
        QueryKind::Find => {
            if !parsed.definition.contains_key("nodes") {
                return Err(QueryError::Validation(
                    "find query must specify a 'nodes' target".to_string(),
                ));
            }
            QueryPlan::Nodes(NodePlan::compile(&parsed.definition, config)?)
        }
        QueryKind::FindNodes => QueryPlan::Nodes(NodePlan::compile(&parsed.definition, config)?),
        QueryKind::FindPath => QueryPlan::Path(PathPlan::compile(&parsed.definition, config)?),
    };

    Ok(CompiledQuery {
        name: parsed.name.clone(),
        kind: parsed.kind,
        plan,
    })
}

/// Sorting then limiting, shared by every plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Finish {
    pub sort: Option<SortSpec>,
    pub limit: Option<usize>,
}

impl Finish {
    pub fn from_definition(definition: &Map<String, Value>) -> Self {
        Self {
            sort: SortSpec::from_definition(definition),
            limit: limit_from_definition(definition),
        }
    }

    pub fn apply<F>(&self, rows: Vec<Row>, fallback: F) -> Vec<Row>
    where
        F: Fn(&Row, &str) -> Option<Value>,
    {
        if rows.is_empty() {
            return rows;
        }
        let mut rows = match &self.sort {
            Some(spec) => sort_rows(rows, spec, fallback),
            None => rows,
        };
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

/// Whether a clause value is present and non-empty.
pub(crate) fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

/// A clause value that is present and non-empty.
pub(crate) fn clause<'d>(definition: &'d Map<String, Value>, key: &str) -> Option<&'d Value> {
    definition.get(key).filter(|value| is_set(Some(*value)))
}

/// A non-negative integer clause, or `default` when absent.
pub(crate) fn count_clause(definition: &Map<String, Value>, key: &str, default: usize) -> Result<usize> {
    match definition.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| QueryError::Validation(format!("'{key}' must be a non-negative integer, got {value}"))),
    }
}

/// A mapping clause; other shapes are rejected.
pub(crate) fn mapping_clause<'d>(
    definition: &'d Map<String, Value>,
    key: &str,
) -> Result<Option<&'d Map<String, Value>>> {
    match definition.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        value if !is_set(value) => Ok(None),
        Some(other) => Err(QueryError::Validation(format!("'{key}' must be a mapping, got {other}"))),
        None => Ok(None),
    }
}

/// Relation types given as one string or a list of strings.
pub(crate) fn relation_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}
