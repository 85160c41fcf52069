//! Error types for the graph store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by fallible store operations.
///
/// The mutation primitives `add_entity`/`add_relationship` report failure as
/// `false` instead; these errors cover consolidation, path search, snapshots
/// and configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entity id must be a non-empty string")]
    EmptyId,

    #[error("entity type must be a non-empty string")]
    EmptyType,

    #[error("invalid traversal direction '{0}' (expected outgoing, incoming or both)")]
    InvalidDirection(String),

    #[error("entities not found: {0:?}")]
    EntityNotFound(Vec<String>),

    #[error("snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
