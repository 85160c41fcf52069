//! Error types for query parsing, compilation and execution.

use graph_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning query text into results.
///
/// [`QueryEngine::execute`](crate::QueryEngine::execute) never returns these
/// directly; they are rendered into a failed response envelope.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query text does not have the `name -> kind -> definition` shape.
    #[error("invalid query format: {0}")]
    Format(String),

    /// A clause is missing or has the wrong shape.
    #[error("invalid query: {0}")]
    Validation(String),

    #[error("unsupported query type '{kind}' in query '{name}'")]
    UnsupportedQueryKind { name: String, kind: String },

    #[error("embedding provider failed: {0}")]
    Provider(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Errors raised by an [`EmbeddingProvider`](crate::EmbeddingProvider).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    #[error("no embeddable tokens in input")]
    EmptyInput,

    #[error("embedding backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
