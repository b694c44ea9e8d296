// src/errors.rs

//! Crate-wide error types.
//!
//! The taxonomy has two halves:
//! - [`ConfigurationError`]: the schema is malformed or the event payload
//!   does not parse. Detected before any node executes; never retried here.
//! - [`ExecutionError`]: a node body failed during `process`. Propagates
//!   synchronously and aborts the run; retry policy (if any) belongs to
//!   whatever dispatch layer wraps `Workflow::run`.

use thiserror::Error;

use crate::schema::NodeId;

/// Errors raised while constructing or validating a workflow, or while
/// parsing the inbound event payload.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("workflow graph contains a cycle involving node '{0}'")]
    Cycle(NodeId),

    #[error("unreachable nodes: [{}]", join_ids(.0))]
    UnreachableNodes(Vec<NodeId>),

    #[error("node '{node}' has {successors} successors but is not marked as a router")]
    RouterArity { node: NodeId, successors: usize },

    #[error("node '{0}' declares concurrent children but is not marked as fan-out")]
    UnexpectedChildren(NodeId),

    #[error("fan-out node '{0}' declares no concurrent children")]
    EmptyFanOut(NodeId),

    #[error("no implementation registered for node '{0}'")]
    MissingBinding(NodeId),

    #[error("node '{0}' binding does not match its config (router flag vs registered variant)")]
    BindingMismatch(NodeId),

    #[error("event payload failed to parse: {0}")]
    EventParse(#[source] serde_json::Error),

    #[error("failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse schema TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors raised while driving a run through the graph.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("node '{node}' failed: {source}")]
    Node {
        node: NodeId,
        #[source]
        source: anyhow::Error,
    },

    #[error("router selected unknown node '{0}'")]
    UnknownNode(NodeId),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Umbrella error returned by [`crate::engine::Workflow::run`].
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
