// src/schema/mod.rs

//! Workflow graph definition and static analysis.
//!
//! - [`model`] holds the immutable schema: node identities, successor
//!   edges, router/fan-out flags, the start node and the typed event.
//! - [`validate`] checks the schema before anything executes: acyclicity,
//!   reachability from start, and connection-arity rules.
//! - [`loader`] reads a schema topology from a TOML file.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{NodeConfig, NodeId, WorkflowSchema};
pub use validate::validate_schema;
