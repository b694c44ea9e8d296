// src/engine/mod.rs

//! Workflow execution engine.
//!
//! This module ties together:
//! - the validated [`Workflow`] (schema + materialized configs + registry)
//! - the main run loop that walks the graph from start, invokes node
//!   bodies, resolves routing and honours the stop flag
//! - the concurrent fan-out group in [`fanout`]

pub mod fanout;
pub mod runtime;

pub use runtime::Workflow;
