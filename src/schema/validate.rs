// src/schema/validate.rs

use std::collections::{HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::ConfigurationError;
use crate::schema::model::{NodeId, WorkflowSchema};

/// Run static validation against a workflow schema.
///
/// This checks, in order:
/// - the successor graph has no cycles
/// - every configured node is reachable from `start`
/// - only nodes marked `is_router` have more than one successor
/// - `concurrent_children` is populated exactly for fan-out nodes
///
/// Validation is deterministic and pure (no I/O). It runs exactly once,
/// inside `Workflow::new`; a schema that fails here never executes.
pub fn validate_schema<E>(schema: &WorkflowSchema<E>) -> Result<(), ConfigurationError> {
    validate_acyclic(schema)?;
    validate_reachability(schema)?;
    validate_arity(schema)?;
    validate_fanout_shape(schema)?;
    Ok(())
}

/// Cycle check via topological sort over the successor edges.
///
/// Edge direction: node -> successor. `toposort` fails on a back-edge
/// and reports a node on the offending cycle.
fn validate_acyclic<E>(schema: &WorkflowSchema<E>) -> Result<(), ConfigurationError> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    graph.add_node(schema.start.as_str());
    for nc in &schema.nodes {
        graph.add_node(nc.id.as_str());
        for next in &nc.successors {
            graph.add_edge(nc.id.as_str(), next.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(ConfigurationError::Cycle(NodeId::new(cycle.node_id()))),
    }
}

/// Breadth-first reachability from the start node.
///
/// Identities referenced only as successors are implicitly reachable by
/// construction; the check applies to every explicitly configured node.
fn validate_reachability<E>(schema: &WorkflowSchema<E>) -> Result<(), ConfigurationError> {
    let mut reachable: HashSet<&NodeId> = HashSet::new();
    let mut queue: VecDeque<&NodeId> = VecDeque::new();
    queue.push_back(&schema.start);

    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(nc) = schema.config(id) {
            queue.extend(nc.successors.iter());
        }
    }

    let mut unreachable: Vec<NodeId> = schema
        .nodes
        .iter()
        .filter(|nc| !reachable.contains(&nc.id))
        .map(|nc| nc.id.clone())
        .collect();

    if unreachable.is_empty() {
        Ok(())
    } else {
        // Sorted so the error message is stable across runs.
        unreachable.sort();
        Err(ConfigurationError::UnreachableNodes(unreachable))
    }
}

/// Only routers may branch: more than one successor requires `is_router`.
fn validate_arity<E>(schema: &WorkflowSchema<E>) -> Result<(), ConfigurationError> {
    for nc in &schema.nodes {
        if nc.successors.len() > 1 && !nc.is_router {
            return Err(ConfigurationError::RouterArity {
                node: nc.id.clone(),
                successors: nc.successors.len(),
            });
        }
    }
    Ok(())
}

/// `concurrent_children` must be populated exactly for fan-out nodes.
fn validate_fanout_shape<E>(schema: &WorkflowSchema<E>) -> Result<(), ConfigurationError> {
    for nc in &schema.nodes {
        if !nc.is_fanout && !nc.concurrent_children.is_empty() {
            return Err(ConfigurationError::UnexpectedChildren(nc.id.clone()));
        }
        if nc.is_fanout && nc.concurrent_children.is_empty() {
            return Err(ConfigurationError::EmptyFanOut(nc.id.clone()));
        }
    }
    Ok(())
}
