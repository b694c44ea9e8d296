// src/node.rs

//! Node capability contracts and the identity -> implementation registry.
//!
//! A node's *shape* (successors, router/fan-out flags) lives in the
//! schema; its *behaviour* is registered here and looked up by identity.
//! Nodes are instantiated fresh from their factory at every invocation,
//! so no instance state survives between visits or runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::TaskContext;
use crate::schema::NodeId;

/// A unit of work that transforms the context.
///
/// Implemented by plain task nodes, fan-out siblings, and the fold step
/// of fan-out nodes. Bodies may perform arbitrary I/O; the engine treats
/// them as opaque and imposes no timeout or retry.
#[async_trait]
pub trait TaskNode<E>: Send + Sync {
    async fn process(&self, ctx: TaskContext<E>) -> anyhow::Result<TaskContext<E>>;
}

/// One routing rule of a router node.
///
/// Rules are pure, stateless decision functions evaluated in declared
/// order; the first rule returning `Some` wins.
pub trait RouterRule<E>: Send + Sync {
    fn determine_next_node(&self, ctx: &TaskContext<E>) -> Option<NodeId>;
}

impl<E, F> RouterRule<E> for F
where
    F: Fn(&TaskContext<E>) -> Option<NodeId> + Send + Sync,
{
    fn determine_next_node(&self, ctx: &TaskContext<E>) -> Option<NodeId> {
        self(ctx)
    }
}

/// Factory producing a fresh task node instance per invocation.
pub type TaskFactory<E> = Arc<dyn Fn() -> Box<dyn TaskNode<E>> + Send + Sync>;

/// Behaviour bound to a node identity.
///
/// The engine switches on this tag (together with the config's fan-out
/// flag) instead of downcasting some common node supertype.
pub enum NodeBinding<E> {
    /// A context-transforming body (task nodes and fan-out nodes).
    Task(TaskFactory<E>),

    /// An ordered rule list plus optional fallback identity.
    Router {
        rules: Vec<Arc<dyn RouterRule<E>>>,
        fallback: Option<NodeId>,
    },
}

/// Registry mapping node identities to their bindings.
///
/// `Workflow::new` cross-checks this against the schema: every
/// executable identity needs a `Task` binding, every router flag needs a
/// `Router` binding.
pub struct NodeRegistry<E> {
    bindings: HashMap<NodeId, NodeBinding<E>>,
}

impl<E> Default for NodeRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> NodeRegistry<E> {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Register a task body for an identity.
    ///
    /// `make` is called once per invocation of the node.
    pub fn register_task<N, F>(&mut self, id: impl Into<NodeId>, make: F)
    where
        N: TaskNode<E> + 'static,
        F: Fn() -> N + Send + Sync + 'static,
    {
        let factory: TaskFactory<E> = Arc::new(move || Box::new(make()));
        self.bindings.insert(id.into(), NodeBinding::Task(factory));
    }

    /// Register a router for an identity: ordered rules plus an optional
    /// fallback used when no rule matches.
    pub fn register_router(
        &mut self,
        id: impl Into<NodeId>,
        rules: Vec<Arc<dyn RouterRule<E>>>,
        fallback: Option<NodeId>,
    ) {
        self.bindings
            .insert(id.into(), NodeBinding::Router { rules, fallback });
    }

    pub fn binding(&self, id: &NodeId) -> Option<&NodeBinding<E>> {
        self.bindings.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.bindings.contains_key(id)
    }
}
