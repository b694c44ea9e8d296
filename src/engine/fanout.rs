// src/engine/fanout.rs

//! Concurrent fan-out/join for the declared siblings of a fan-out node.
//!
//! All siblings start together, each against a cloned snapshot of the
//! context, and interleave cooperatively on their await points — no
//! extra tasks are spawned, so a single logical worker drives the whole
//! group. The join is all-or-nothing: the first sibling error fails the
//! group (unfinished siblings are dropped) and aborts the run.

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::context::TaskContext;
use crate::engine::runtime::Workflow;
use crate::errors::ExecutionError;
use crate::schema::{NodeConfig, NodeId};

/// Run the declared children of `parent` concurrently and join them.
///
/// On success, each sibling's full delta is merged back into the parent
/// context in declared order: every result record it wrote (shallow,
/// last write wins per field), its metadata entries, and its stop flag.
/// Siblings writing to disjoint result keys all survive the join; a
/// sibling that requested a stop halts the run at the next loop
/// boundary. The fan-out node's own `process` runs afterwards and may
/// reconcile.
pub(crate) async fn run_fan_out<E>(
    workflow: &Workflow<E>,
    parent: &NodeId,
    config: &NodeConfig,
    mut ctx: TaskContext<E>,
) -> Result<TaskContext<E>, ExecutionError>
where
    E: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let children = &config.concurrent_children;
    info!(node = %parent, children = children.len(), "launching fan-out group");

    let siblings = try_join_all(
        children
            .iter()
            .map(|child| workflow.invoke(child, ctx.clone())),
    )
    .await?;

    for (child, sibling) in children.iter().zip(siblings) {
        debug!(node = %parent, child = %child, "merging sibling context");
        for (node, record) in sibling.results() {
            ctx.update(node.clone(), record.clone());
        }
        for (key, value) in &sibling.metadata {
            ctx.metadata.insert(key.clone(), value.clone());
        }
        if sibling.is_stopped() {
            ctx.stop();
        }
    }

    info!(node = %parent, "fan-out group joined");
    Ok(ctx)
}
