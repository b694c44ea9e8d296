// src/lib.rs

//! flowdag — a DAG workflow orchestration core.
//!
//! flowdag defines and executes a directed acyclic graph of processing
//! nodes over a mutable run-scoped context. It supports:
//!
//! - sequential chains of task nodes
//! - conditional branching through router nodes (ordered rules plus an
//!   optional fallback)
//! - concurrent fan-out/join groups with all-or-nothing semantics
//!
//! The flow for an embedding application is:
//!
//! 1. author a [`WorkflowSchema`] (in code or from TOML via
//!    [`schema::loader`]) and a [`NodeRegistry`] of node bodies
//! 2. construct a [`Workflow`] — static validation (cycles,
//!    reachability, router arity) runs exactly once here
//! 3. call [`Workflow::run`] with a raw event payload; the final
//!    [`TaskContext`] comes back with one result record per visited node
//!
//! Everything around this core — the API layer accepting events, the
//! services node bodies call out to, persistence of run results, and
//! asynchronous dispatch/retry — lives outside this crate.

pub mod context;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod node;
pub mod schema;
pub mod viz;

pub use context::{NodeResult, TaskContext};
pub use engine::Workflow;
pub use errors::{ConfigurationError, ExecutionError, Result, WorkflowError};
pub use node::{NodeBinding, NodeRegistry, RouterRule, TaskFactory, TaskNode};
pub use schema::{NodeConfig, NodeId, WorkflowSchema};
