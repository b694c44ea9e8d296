// src/engine/runtime.rs

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use crate::context::TaskContext;
use crate::engine::fanout::run_fan_out;
use crate::errors::{ConfigurationError, ExecutionError, Result};
use crate::node::{NodeBinding, NodeRegistry, TaskNode};
use crate::schema::{validate_schema, NodeConfig, NodeId, WorkflowSchema};

/// Terminal state of a run.
///
/// `Stopped` means a node set the stop flag and the engine halted at the
/// next loop boundary; `Completed` covers both running off the end of a
/// chain and routing exhaustion (no rule matched, no fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Running,
    Completed,
    Stopped,
}

/// A validated, executable workflow: immutable schema plus the registry
/// of node bodies.
///
/// Construction runs the static validator exactly once and cross-checks
/// that every identity the graph can reach has a matching binding; a
/// `Workflow` that exists can be run. The workflow itself holds no
/// per-run state, so one instance can serve any number of independent
/// runs.
pub struct Workflow<E> {
    schema: WorkflowSchema<E>,

    /// Materialized identity -> config map. Identities referenced only
    /// as successors or fan-out children get an implicit empty config.
    pub(crate) configs: BTreeMap<NodeId, NodeConfig>,

    registry: NodeRegistry<E>,
}

impl<E> Workflow<E> {
    /// Validate the schema and bind it to its node implementations.
    pub fn new(
        schema: WorkflowSchema<E>,
        registry: NodeRegistry<E>,
    ) -> std::result::Result<Self, ConfigurationError> {
        validate_schema(&schema)?;
        let configs = materialize_configs(&schema);
        check_bindings(&configs, &registry)?;

        Ok(Self {
            schema,
            configs,
            registry,
        })
    }

    pub fn description(&self) -> Option<&str> {
        self.schema.description.as_deref()
    }

    pub fn start(&self) -> &NodeId {
        &self.schema.start
    }

    /// Instantiate a fresh task node for an identity.
    ///
    /// Bindings were checked at construction, so this only fails for
    /// identities the graph never declared (e.g. a router rule inventing
    /// one).
    pub(crate) fn instantiate(
        &self,
        id: &NodeId,
    ) -> std::result::Result<Box<dyn TaskNode<E>>, ExecutionError> {
        match self.registry.binding(id) {
            Some(NodeBinding::Task(factory)) => Ok(factory()),
            _ => Err(ExecutionError::UnknownNode(id.clone())),
        }
    }
}

impl<E> Workflow<E>
where
    E: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Execute the workflow for a raw event payload.
    ///
    /// The payload is parsed into the schema's typed event first (a parse
    /// failure is a configuration error and nothing executes). The engine
    /// then walks the graph from start until it runs off the end, routing
    /// exhausts, or a node sets the stop flag. Any node error aborts the
    /// run immediately; the context is not rolled back.
    pub async fn run(&self, raw_event: serde_json::Value) -> Result<TaskContext<E>> {
        let event = self.schema.parse_event(raw_event)?;

        let mut ctx = TaskContext::new(event);
        let mut state = EngineState::Running;
        let mut current = Some(self.schema.start.clone());

        while let Some(node_id) = current.take() {
            // Stop flag is sampled only here, between node executions.
            if ctx.is_stopped() {
                info!(node = %node_id, "stop flag set; halting run before node");
                state = EngineState::Stopped;
                break;
            }

            let config = self
                .configs
                .get(&node_id)
                .ok_or_else(|| ExecutionError::UnknownNode(node_id.clone()))?;

            if config.is_router {
                current = self.route(&node_id, &ctx)?;
                continue;
            }

            if config.is_fanout {
                ctx = run_fan_out(self, &node_id, config, ctx).await?;
            }

            ctx = self.invoke(&node_id, ctx).await?;
            current = config.successors.first().cloned();
        }

        if state == EngineState::Running {
            state = EngineState::Completed;
        }
        info!(?state, "workflow run finished");

        Ok(ctx)
    }

    /// Execute the workflow from a synchronous caller.
    ///
    /// Spins up a current-thread runtime for the duration of the run.
    /// Use this from a queue worker or plain script; async callers
    /// should use [`Workflow::run`] directly.
    pub fn run_blocking(&self, raw_event: serde_json::Value) -> Result<TaskContext<E>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ExecutionError::from)?;
        runtime.block_on(self.run(raw_event))
    }

    /// Run one task node body with enter/exit logging on all paths.
    pub(crate) async fn invoke(
        &self,
        id: &NodeId,
        ctx: TaskContext<E>,
    ) -> std::result::Result<TaskContext<E>, ExecutionError> {
        let node = self.instantiate(id)?;

        info!(node = %id, "starting node");
        let outcome = node.process(ctx).await;
        match outcome {
            Ok(ctx) => {
                info!(node = %id, "finished node");
                Ok(ctx)
            }
            Err(source) => {
                error!(node = %id, error = %source, "error in node");
                info!(node = %id, "finished node");
                Err(ExecutionError::Node {
                    node: id.clone(),
                    source,
                })
            }
        }
    }

    /// Evaluate a router's ordered rules; first match wins, then the
    /// fallback, then `None` (the run terminates as completed).
    fn route(
        &self,
        id: &NodeId,
        ctx: &TaskContext<E>,
    ) -> std::result::Result<Option<NodeId>, ExecutionError> {
        let Some(NodeBinding::Router { rules, fallback }) = self.registry.binding(id) else {
            return Err(ExecutionError::UnknownNode(id.clone()));
        };

        for rule in rules {
            if let Some(next) = rule.determine_next_node(ctx) {
                debug!(node = %id, next = %next, "router rule matched");
                return Ok(Some(next));
            }
        }

        match fallback {
            Some(next) => {
                debug!(node = %id, next = %next, "no router rule matched; using fallback");
                Ok(Some(next.clone()))
            }
            None => {
                debug!(node = %id, "no router rule matched and no fallback; routing exhausted");
                Ok(None)
            }
        }
    }
}

/// Build the full identity -> config map from a validated schema.
///
/// Identities that appear as start, successor or fan-out child without
/// an explicit config get an implicit empty one (a terminal task).
fn materialize_configs<E>(schema: &WorkflowSchema<E>) -> BTreeMap<NodeId, NodeConfig> {
    let mut configs: BTreeMap<NodeId, NodeConfig> = schema
        .nodes
        .iter()
        .map(|nc| (nc.id.clone(), nc.clone()))
        .collect();

    let mut referenced: Vec<NodeId> = vec![schema.start.clone()];
    for nc in &schema.nodes {
        referenced.extend(nc.successors.iter().cloned());
        referenced.extend(nc.concurrent_children.iter().cloned());
    }

    for id in referenced {
        configs
            .entry(id.clone())
            .or_insert_with(|| NodeConfig::task(id));
    }

    configs
}

/// Cross-check registry coverage against the materialized configs.
///
/// Router-flagged identities need a `Router` binding; everything else
/// that can execute (tasks, fan-out nodes, their children) needs a
/// `Task` binding.
fn check_bindings<E>(
    configs: &BTreeMap<NodeId, NodeConfig>,
    registry: &NodeRegistry<E>,
) -> std::result::Result<(), ConfigurationError> {
    for (id, config) in configs {
        match (config.is_router, registry.binding(id)) {
            (_, None) => return Err(ConfigurationError::MissingBinding(id.clone())),
            (true, Some(NodeBinding::Router { .. })) => {}
            (false, Some(NodeBinding::Task(_))) => {}
            _ => return Err(ConfigurationError::BindingMismatch(id.clone())),
        }
    }
    Ok(())
}
