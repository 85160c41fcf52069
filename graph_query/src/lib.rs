//! # Graph Query
//!
//! A declarative query engine over a [`graph_store::GraphStore`]. Queries are
//! YAML documents naming a query and its kind (`find`, `find_nodes`,
//! `find_path`); the engine parses them, compiles them into typed plans and
//! executes those plans against the store.
//!
//! ## Core Components
//!
//! - **parser**: query text to name, kind and clause map
//! - **condition**: typed condition trees for `where`, `properties` and text clauses
//! - **filters**: candidate filter stages, including semantic similarity
//! - **compiler**: node and path plans, sorting and limiting
//! - **formatter**: result rows and the response envelope
//! - **embedding**: the embedding provider contract
//! - **engine**: the [`QueryEngine`] facade

pub mod compiler;
pub mod condition;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod filters;
pub mod formatter;
pub mod parser;

pub use compiler::{compile, CompiledQuery, ExecutionContext, QueryPlan};
pub use config::*;
pub use embedding::*;
pub use engine::*;
pub use error::{EmbeddingError, QueryError, Result};
pub use formatter::*;
pub use parser::{parse, ParsedQuery, QueryKind};
