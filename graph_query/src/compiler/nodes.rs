//! Node queries: filter pipeline, simple listing and connectivity expansion.

use graph_store::{Direction, GraphStore};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use super::{clause, count_clause, mapping_clause, relation_list, ExecutionContext, Finish};
use crate::condition::{value_text, Condition, FieldMatch, FieldSpec};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::filters::{
    by_condition, by_connectivity, by_field_spec, by_filter_spec, by_name, by_properties,
    by_semantic_similarity, by_type, ConnectivityFilter, FilterSpec, PropertyFilter, SemanticFilter,
    Threshold,
};
use crate::formatter::{QueryResults, ResultFormatter, Row, Subgraph};
use crate::parser::{extract_nodes_definition, extract_return_fields};

/// One step of the candidate pipeline.
#[derive(Debug, Clone)]
pub enum FilterStage {
    Type(String),
    Name(String),
    Properties(PropertyFilter),
    Semantic(SemanticFilter),
    FieldSpec(FieldSpec),
    Filter(FilterSpec),
    Where(Condition),
    ConnectedTo(ConnectivityFilter),
}

impl FilterStage {
    fn apply(&self, ctx: &ExecutionContext<'_>, candidates: Vec<String>) -> Vec<String> {
        let store = ctx.store;
        match self {
            FilterStage::Type(entity_type) => by_type(store, candidates, entity_type),
            FilterStage::Name(name) => by_name(candidates, name),
            FilterStage::Properties(filter) => by_properties(store, candidates, filter),
            FilterStage::Semantic(filter) => by_semantic_similarity(store, ctx.provider, candidates, filter),
            FilterStage::FieldSpec(spec) => by_field_spec(store, candidates, spec),
            FilterStage::Filter(spec) => by_filter_spec(store, candidates, spec),
            FilterStage::Where(condition) => by_condition(store, candidates, condition),
            FilterStage::ConnectedTo(filter) => by_connectivity(store, candidates, filter),
        }
    }
}

/// How matching nodes are turned into results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeMode {
    /// A flat list of rows.
    List,
    /// Expand each match through the graph and return the induced subgraph.
    Expand {
        relations: Option<Vec<String>>,
        depth: usize,
    },
}

#[derive(Debug, Clone)]
pub struct NodePlan {
    pub stages: Vec<FilterStage>,
    pub mode: NodeMode,
    pub return_fields: Vec<String>,
    pub finish: Finish,
}

impl NodePlan {
    /// Build the plan for a node query.
    ///
    /// Stages run in this order: type, name, properties, semantic similarity,
    /// description, `filter`, `where`, `connected_to`, and finally top-level
    /// `properties` when the node clauses carry none.
    pub fn compile(definition: &Map<String, Value>, config: &EngineConfig) -> Result<Self> {
        let nodes = extract_nodes_definition(definition);
        let mut stages = Vec::new();

        if let Some(entity_type) = clause(nodes, "type") {
            stages.push(FilterStage::Type(value_text(entity_type)));
        }
        if let Some(name) = clause(nodes, "name") {
            stages.push(FilterStage::Name(value_text(name)));
        }
        if let Some(properties) = mapping_clause(nodes, "properties")? {
            stages.push(FilterStage::Properties(PropertyFilter::from_map(properties)));
        }
        if let Some(similar_to) = clause(nodes, "similar_to") {
            let threshold = nodes
                .get("threshold")
                .map(Threshold::parse)
                .unwrap_or_else(|| Threshold::at_least(config.default_similarity_threshold));
            stages.push(FilterStage::Semantic(SemanticFilter::new(value_text(similar_to), threshold)));
        }
        if let Some(Value::Object(spec)) = nodes.get("description") {
            stages.push(FilterStage::FieldSpec(FieldSpec::new(
                "description",
                FieldMatch::from_field_spec(spec),
            )));
        }
        if let Some(spec) = mapping_clause(definition, "filter")? {
            stages.push(FilterStage::Filter(FilterSpec::from_map(spec)));
        }
        if let Some(condition) = clause(definition, "where") {
            stages.push(FilterStage::Where(Condition::from_value(condition)));
        }
        if let Some(spec) = mapping_clause(definition, "connected_to")? {
            stages.push(FilterStage::ConnectedTo(ConnectivityFilter {
                entity: clause(spec, "entity").map(value_text),
                max_depth: count_clause(spec, "max_depth", config.default_connected_to_depth)?,
                via: relation_list(spec.get("via")),
            }));
        }
        if !nodes.contains_key("properties") {
            if let Some(properties) = mapping_clause(definition, "properties")? {
                stages.push(FilterStage::Properties(PropertyFilter::from_map(properties)));
            }
        }

        let relations = relation_list(definition.get("relations"));
        let mode = if relations.is_some() || definition.contains_key("depth") {
            NodeMode::Expand {
                relations,
                depth: count_clause(definition, "depth", config.default_depth)?,
            }
        } else {
            NodeMode::List
        };

        Ok(Self {
            stages,
            mode,
            return_fields: extract_return_fields(nodes, definition, &config.default_return_fields),
            finish: Finish::from_definition(definition),
        })
    }

    /// Run the pipeline over every entity in the store.
    pub fn execute(&self, ctx: &ExecutionContext<'_>) -> QueryResults {
        let mut candidates: Vec<String> = ctx.store.entities().map(|e| e.id.clone()).collect();
        for stage in &self.stages {
            candidates = stage.apply(ctx, candidates);
        }
        debug!(matches = candidates.len(), "node filters applied");

        match &self.mode {
            NodeMode::List => {
                let rows = ResultFormatter::format_node_results(ctx.store, &candidates, &self.return_fields);
                QueryResults::Rows(self.finish.apply(rows, |row, field| entity_attribute(ctx.store, row, field)))
            }
            NodeMode::Expand { relations, depth } => {
                QueryResults::Subgraph(self.expand(ctx, candidates, relations.as_deref(), *depth))
            }
        }
    }

    fn expand(
        &self,
        ctx: &ExecutionContext<'_>,
        starting_nodes: Vec<String>,
        relations: Option<&[String]>,
        depth: usize,
    ) -> Subgraph {
        if starting_nodes.is_empty() {
            return Subgraph::default();
        }

        let mut all_nodes = starting_nodes.clone();
        let mut in_result: HashSet<String> = starting_nodes.iter().cloned().collect();
        let mut connected_nodes = Vec::new();
        let mut connected_seen = HashSet::new();

        for start in &starting_nodes {
            for id in ctx.store.find_connected(start, depth, relations, Direction::Both) {
                if connected_seen.insert(id.clone()) {
                    connected_nodes.push(id.clone());
                }
                if in_result.insert(id.clone()) {
                    all_nodes.push(id);
                }
            }
        }

        let view = ctx.store.induced_subgraph(&all_nodes);
        let rows = ResultFormatter::format_node_results(ctx.store, &all_nodes, &self.return_fields);
        let nodes = self
            .finish
            .apply(rows, |row, field| entity_attribute(ctx.store, row, field));
        let edges: Vec<Row> = view.edges.iter().map(ResultFormatter::format_edge).collect();

        Subgraph {
            node_count: nodes.len(),
            edge_count: edges.len(),
            nodes,
            edges,
            starting_nodes,
            connected_nodes,
        }
    }
}

/// Sort fallback: read a field the row does not carry from its entity.
fn entity_attribute(store: &GraphStore, row: &Row, field: &str) -> Option<Value> {
    let id = row.get("name")?.as_str()?;
    store.get_entity(id)?.attribute(field).map(|v| v.to_json())
}
