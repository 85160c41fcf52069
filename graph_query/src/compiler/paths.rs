//! Path queries.

use graph_store::GraphStore;
use serde_json::{Map, Value};
use tracing::warn;

use super::{clause, count_clause, ExecutionContext, Finish};
use crate::condition::value_text;
use crate::config::EngineConfig;
use crate::embedding::{dot, EmbeddingProvider};
use crate::error::{QueryError, Result};
use crate::formatter::{QueryResults, Row};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPlan {
    pub from: String,
    pub to: String,
    pub max_hops: usize,
    pub finish: Finish,
}

impl PathPlan {
    /// Build the plan. `from` and `to` are required.
    pub fn compile(definition: &Map<String, Value>, config: &EngineConfig) -> Result<Self> {
        let (Some(from), Some(to)) = (endpoint(definition, "from"), endpoint(definition, "to")) else {
            return Err(QueryError::Validation(
                "'from' and 'to' nodes must be specified for path finding".to_string(),
            ));
        };

        Ok(Self {
            from,
            to,
            max_hops: count_clause(definition, "max_hops", config.default_max_hops)?,
            finish: Finish::from_definition(definition),
        })
    }

    /// Find all shortest paths and wrap each as
    /// `{path, length, semantic_coherence}`.
    pub fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<QueryResults> {
        let paths = ctx.store.shortest_paths(&self.from, &self.to, self.max_hops)?;

        let rows = paths
            .into_iter()
            .map(|path| {
                let length = path.len().saturating_sub(1);
                let coherence = semantic_coherence(ctx.store, ctx.provider, &path);
                let mut row = Row::new();
                row.insert("path".to_string(), Value::from(path));
                row.insert("length".to_string(), Value::from(length));
                row.insert("semantic_coherence".to_string(), Value::from(coherence));
                row
            })
            .collect();

        Ok(QueryResults::Rows(self.finish.apply(rows, |_, _| None)))
    }
}

fn endpoint(definition: &Map<String, Value>, key: &str) -> Option<String> {
    clause(definition, key).map(value_text)
}

/// Similarity of each consecutive pair on a path. Empty without a provider
/// or when any embedding fails.
pub fn semantic_coherence(
    store: &GraphStore,
    provider: Option<&dyn EmbeddingProvider>,
    path: &[String],
) -> Vec<f32> {
    let Some(provider) = provider else {
        return Vec::new();
    };
    if path.len() < 2 {
        return Vec::new();
    }

    let embeddings: std::result::Result<Vec<Vec<f32>>, _> = path
        .iter()
        .map(|id| {
            let text = store.get_entity(id).map_or(id.as_str(), |e| e.embedding_text());
            provider.embed(text)
        })
        .collect();

    match embeddings {
        Ok(embeddings) => embeddings.windows(2).map(|pair| dot(&pair[0], &pair[1])).collect(),
        Err(e) => {
            warn!(error = %e, "could not score path coherence");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::parser::parse;

    fn chain() -> GraphStore {
        let mut store = GraphStore::new();
        store.add_entity("A", "Node", None, Some("red apple"));
        store.add_entity("B", "Node", None, Some("red cherry"));
        store.add_entity("C", "Node", None, None);
        store.add_relationship("A", "B", "rel", None, 1.0);
        store.add_relationship("B", "C", "rel", None, 1.0);
        store
    }

    #[test]
    fn test_requires_endpoints() {
        let parsed = parse("q:\n  find_path:\n    from: A\n").unwrap();
        let err = PathPlan::compile(&parsed.definition, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, QueryError::Validation(_)));
    }

    #[test]
    fn test_path_rows() {
        let store = chain();
        let parsed = parse("q:\n  find_path:\n    from: A\n    to: C\n").unwrap();
        let plan = PathPlan::compile(&parsed.definition, &EngineConfig::default()).unwrap();
        assert_eq!(plan.max_hops, 5);

        let results = plan.execute(&ExecutionContext::new(&store, None)).unwrap();
        let rows = results.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["path"], serde_json::json!(["A", "B", "C"]));
        assert_eq!(rows[0]["length"], 2);
        assert_eq!(rows[0]["semantic_coherence"], serde_json::json!([]));
    }

    #[test]
    fn test_coherence_with_provider() {
        let store = chain();
        let embedder = HashingEmbedder::default();
        let path: Vec<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();

        let scores = semantic_coherence(&store, Some(&embedder), &path);
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > 0.4);

        assert!(semantic_coherence(&store, Some(&embedder), &path[..1]).is_empty());
    }

    #[test]
    fn test_missing_endpoint_is_store_error() {
        let store = chain();
        let parsed = parse("q:\n  find_path:\n    from: A\n    to: Z\n").unwrap();
        let plan = PathPlan::compile(&parsed.definition, &EngineConfig::default()).unwrap();
        let err = plan.execute(&ExecutionContext::new(&store, None)).unwrap_err();
        assert!(matches!(err, QueryError::Store(_)));
    }
}
