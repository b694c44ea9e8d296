// src/context.rs

//! Run-scoped mutable state threaded through one workflow run.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::schema::NodeId;

/// Result record for a single node: named fields, merged shallowly.
pub type NodeResult = serde_json::Map<String, Value>;

/// Mutable context for one run of a workflow.
///
/// Created fresh per `run` call, mutated node-by-node, returned to the
/// caller at the end; never reused across runs. The context is not
/// internally synchronized: the engine is the single writer between
/// nodes, and fan-out siblings each mutate their own cloned snapshot,
/// so concurrent writers never share this value.
#[derive(Debug, Clone)]
pub struct TaskContext<E> {
    /// The typed event that triggered this run.
    pub event: E,

    /// Per-node result records, keyed by node identity.
    ///
    /// `BTreeMap` keeps iteration deterministic for a fixed schema and
    /// event, which the determinism guarantees lean on.
    results: BTreeMap<NodeId, NodeResult>,

    /// Run-scoped metadata for node bodies and the embedding application.
    ///
    /// The engine itself never writes here; node configuration is passed
    /// explicitly inside the engine rather than smuggled through this map.
    pub metadata: serde_json::Map<String, Value>,

    stopped: bool,
}

impl<E> TaskContext<E> {
    pub fn new(event: E) -> Self {
        Self {
            event,
            results: BTreeMap::new(),
            metadata: serde_json::Map::new(),
            stopped: false,
        }
    }

    /// Merge `fields` into the result record for `node`, creating the
    /// record if absent. Merge is shallow: last write wins per field.
    ///
    /// Each node should treat its own record as exclusively owned; two
    /// nodes writing the same record is a discipline violation, not
    /// something this type guards against.
    pub fn update(&mut self, node: impl Into<NodeId>, fields: NodeResult) {
        let record = self.results.entry(node.into()).or_default();
        for (key, value) in fields {
            record.insert(key, value);
        }
    }

    /// Set a single field in the result record for `node`.
    pub fn update_field(
        &mut self,
        node: impl Into<NodeId>,
        key: impl Into<String>,
        value: Value,
    ) {
        self.results
            .entry(node.into())
            .or_default()
            .insert(key.into(), value);
    }

    /// The result record for a node, if it has written one.
    pub fn result(&self, node: &NodeId) -> Option<&NodeResult> {
        self.results.get(node)
    }

    /// All result records, in identity order.
    pub fn results(&self) -> &BTreeMap<NodeId, NodeResult> {
        &self.results
    }

    /// Request that the run stop after the current node completes.
    ///
    /// The flag is sampled only at engine loop boundaries; a node that is
    /// already executing always runs to completion.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
