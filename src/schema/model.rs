// src/schema/model.rs

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// Identity of a node kind in the workflow graph.
///
/// One identity = one vertex. Identities are plain interned strings used
/// as graph keys and result-record keys; the actual node behaviour is
/// looked up separately in a [`crate::node::NodeRegistry`], so nothing
/// long-lived hangs off the identity itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// Static configuration of a single node in the graph.
///
/// - `successors` are the ordered outgoing edges. Only routers may have
///   more than one (the validator enforces this).
/// - `concurrent_children` is only meaningful when `is_fanout` is set:
///   the engine runs those siblings together and joins them before the
///   node's own `process` is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub id: NodeId,

    #[serde(default)]
    pub successors: Vec<NodeId>,

    #[serde(default)]
    pub is_router: bool,

    #[serde(default)]
    pub is_fanout: bool,

    #[serde(default)]
    pub concurrent_children: Vec<NodeId>,

    #[serde(default)]
    pub description: Option<String>,
}

impl NodeConfig {
    /// A plain task node with no outgoing edges yet.
    pub fn task(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            successors: Vec::new(),
            is_router: false,
            is_fanout: false,
            concurrent_children: Vec::new(),
            description: None,
        }
    }

    /// A router node with its ordered candidate successors.
    pub fn router(id: impl Into<NodeId>, successors: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            id: id.into(),
            successors: successors.into_iter().collect(),
            is_router: true,
            is_fanout: false,
            concurrent_children: Vec::new(),
            description: None,
        }
    }

    /// A fan-out node with its declared concurrent children.
    pub fn fan_out(id: impl Into<NodeId>, children: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            id: id.into(),
            successors: Vec::new(),
            is_router: false,
            is_fanout: true,
            concurrent_children: children.into_iter().collect(),
            description: None,
        }
    }

    /// Append a successor edge.
    pub fn successor(mut self, next: impl Into<NodeId>) -> Self {
        self.successors.push(next.into());
        self
    }

    /// Attach a human-readable description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

/// Immutable definition of a workflow graph, generic over the typed
/// event `E` that raw payloads are parsed into.
///
/// A schema is authored once and never mutated afterwards; per-run state
/// lives in [`crate::context::TaskContext`].
#[derive(Debug, Clone)]
pub struct WorkflowSchema<E> {
    pub description: Option<String>,
    pub start: NodeId,
    pub nodes: Vec<NodeConfig>,
    _event: PhantomData<fn() -> E>,
}

impl<E> WorkflowSchema<E> {
    pub fn new(start: impl Into<NodeId>, nodes: Vec<NodeConfig>) -> Self {
        Self {
            description: None,
            start: start.into(),
            nodes,
            _event: PhantomData,
        }
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Look up the explicit config for an identity, if any.
    pub fn config(&self, id: &NodeId) -> Option<&NodeConfig> {
        self.nodes.iter().find(|nc| nc.id == *id)
    }
}

impl<E: DeserializeOwned> WorkflowSchema<E> {
    /// Parse a raw structured payload into the typed event.
    ///
    /// A parse failure is a [`ConfigurationError`]: it happens before any
    /// node runs and the engine never retries it.
    pub fn parse_event(&self, raw: serde_json::Value) -> Result<E, ConfigurationError> {
        serde_json::from_value(raw).map_err(ConfigurationError::EventParse)
    }
}
