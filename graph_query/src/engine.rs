//! Query engine facade - parse, compile and execute in one call.

use graph_store::GraphStore;
use std::time::Instant;
use tracing::{debug, error};

use crate::compiler::{compile, CompiledQuery, ExecutionContext};
use crate::config::EngineConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{QueryError, Result};
use crate::formatter::{QueryResponse, QueryResults, ResultFormatter};
use crate::parser::{parse, ParsedQuery};

/// Name and type reported when a query fails before they are known.
const UNKNOWN: &str = "unknown";

/// Runs queries against a borrowed store.
///
/// The engine holds no state of its own beyond configuration; build one per
/// batch of queries, or keep one around while the store is not being
/// written.
pub struct QueryEngine<'a> {
    store: &'a GraphStore,
    provider: Option<&'a dyn EmbeddingProvider>,
    config: EngineConfig,
    formatter: ResultFormatter,
}

impl<'a> QueryEngine<'a> {
    /// Create a new engine. Semantic clauses need a `provider`.
    pub fn new(
        store: &'a GraphStore,
        provider: Option<&'a dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> Self {
        let formatter = ResultFormatter::new(config.time_precision);
        Self {
            store,
            provider,
            config,
            formatter,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse query text.
    pub fn parse(&self, text: &str) -> Result<ParsedQuery> {
        parse(text)
    }

    /// Compile a parsed query with this engine's defaults.
    pub fn compile(&self, parsed: &ParsedQuery) -> Result<CompiledQuery> {
        compile(parsed, &self.config)
    }

    /// Parse, compile and run, returning raw results or the first error.
    pub fn run(&self, text: &str) -> Result<QueryResults> {
        let compiled = self.compile(&self.parse(text)?)?;
        compiled.execute(&self.context())
    }

    /// Execute query text and wrap the outcome in a response envelope.
    ///
    /// Never fails: errors become an envelope with `success: false` and the
    /// error message. The query name and type are reported when parsing got
    /// far enough to know them.
    pub fn execute(&self, text: &str) -> QueryResponse {
        let started = Instant::now();
        let mut header: Option<(String, String)> = None;

        let outcome = self.parse(text).and_then(|parsed| {
            header = Some((parsed.name.clone(), parsed.kind.to_string()));
            let compiled = self.compile(&parsed)?;
            compiled.execute(&self.context())
        });
        let elapsed = started.elapsed();

        match outcome {
            Ok(results) => {
                let (name, kind) = header.unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string()));
                debug!(query = %name, results = results.result_count(), ?elapsed, "query executed");
                self.formatter
                    .format_query_response(true, &name, &kind, Some(results), elapsed, None)
            }
            Err(e) => {
                let (name, kind) = match (&e, header) {
                    (_, Some(header)) => header,
                    (QueryError::UnsupportedQueryKind { name, kind }, None) => (name.clone(), kind.clone()),
                    _ => (UNKNOWN.to_string(), UNKNOWN.to_string()),
                };
                error!(query = %name, error = %e, "query execution failed");
                self.formatter
                    .format_query_response(false, &name, &kind, None, elapsed, Some(e.to_string()))
            }
        }
    }

    fn context(&self) -> ExecutionContext<'a> {
        ExecutionContext::new(self.store, self.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GraphStore {
        let mut store = GraphStore::new();
        store.add_entity("John", "Person", None, None);
        store.add_entity("Acme", "Organization", None, None);
        store.add_relationship("John", "Acme", "works_at", None, 1.0);
        store
    }

    #[test]
    fn test_execute_success() {
        let store = store();
        let engine = QueryEngine::new(&store, None, EngineConfig::default());

        let response = engine.execute("people:\n  find:\n    nodes:\n      type: Person\n");
        assert!(response.success);
        assert_eq!(response.query_name, "people");
        assert_eq!(response.query_type, "find");
        assert_eq!(response.result_count, Some(1));
    }

    #[test]
    fn test_failure_reports_known_name() {
        let store = store();
        let engine = QueryEngine::new(&store, None, EngineConfig::default());

        let response = engine.execute("broken:\n  find:\n    type: Person\n");
        assert!(!response.success);
        assert_eq!(response.query_name, "broken");
        assert_eq!(response.query_type, "find");
        assert!(response.results.is_none());
        assert!(response.error.unwrap().contains("nodes"));

        let response = engine.execute("odd:\n  summarize: {}\n");
        assert_eq!(response.query_name, "odd");
        assert_eq!(response.query_type, "summarize");

        let response = engine.execute("- a\n- b\n");
        assert_eq!(response.query_name, "unknown");
        assert_eq!(response.query_type, "unknown");
    }

    #[test]
    fn test_run_returns_errors() {
        let store = store();
        let engine = QueryEngine::new(&store, None, EngineConfig::default());
        assert!(matches!(
            engine.run("p:\n  find_path:\n    from: John\n"),
            Err(QueryError::Validation(_))
        ));
    }
}
