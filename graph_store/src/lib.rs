//! # Graph Store
//!
//! The storage half of the knowledge graph: a directed multigraph of typed
//! entities joined by typed, weighted relationships. Provides upsert with
//! Person-id normalization, bounded breadth-first traversal, shortest-path
//! search, induced subgraphs, entity consolidation and JSON snapshots.
//!
//! This crate knows nothing about queries; see `graph_query` for that.

pub mod config;
pub mod entities;
pub mod error;
pub mod relationships;
pub mod snapshot;
pub mod store;

pub use config::*;
pub use entities::*;
pub use error::{Result, StoreError};
pub use relationships::*;
pub use snapshot::*;
pub use store::*;
