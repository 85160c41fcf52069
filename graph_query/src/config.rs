//! Engine configuration and combined settings files.

use graph_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{QueryError, Result};

/// Defaults applied when a query leaves a clause out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Traversal depth for connectivity expansion (`depth`).
    pub default_depth: usize,

    /// Traversal depth for `connected_to` filters (`max_depth`).
    pub default_connected_to_depth: usize,

    /// Hop bound for path queries (`max_hops`).
    pub default_max_hops: usize,

    /// Similarity a candidate must reach (`>=`) when `threshold` is absent.
    pub default_similarity_threshold: f64,

    /// Fields returned per node when no `return` clause is given.
    pub default_return_fields: Vec<String>,

    /// Decimal places kept in `execution_time`.
    pub time_precision: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_depth: 2,
            default_connected_to_depth: 2,
            default_max_hops: 5,
            default_similarity_threshold: 0.5,
            default_return_fields: vec!["name".to_string(), "type".to_string()],
            time_precision: 4,
        }
    }
}

impl EngineConfig {
    /// Parse from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&read_config(path.as_ref())?)
    }
}

/// Store and engine configuration read from one file:
///
/// ```toml
/// [store]
/// snapshot_path = "data/knowledge_graph.json"
///
/// [query]
/// default_max_hops = 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreConfig,
    pub query: EngineConfig,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&read_config(path.as_ref())?)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| QueryError::Io {
        path: path.to_path_buf(),
        source,
    })
}
