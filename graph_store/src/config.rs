//! Store configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Default snapshot file name.
pub const DEFAULT_SNAPSHOT_FILE: &str = "knowledge_graph.json";

/// Configuration for a [`GraphStore`](crate::GraphStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Where `save()`/`load()` read and write the snapshot.
    pub snapshot_path: PathBuf,

    /// Write indented JSON snapshots.
    pub pretty_snapshots: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            pretty_snapshots: true,
        }
    }
}

impl StoreConfig {
    /// Config with a snapshot file inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            snapshot_path: dir.as_ref().join(DEFAULT_SNAPSHOT_FILE),
            ..Self::default()
        }
    }

    /// Parse from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_toml_str(&text)
    }
}
