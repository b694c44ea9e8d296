// src/schema/loader.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::errors::ConfigurationError;
use crate::schema::model::{NodeConfig, NodeId, WorkflowSchema};
use crate::schema::validate::validate_schema;

/// Top-level schema file as read from TOML.
///
/// This maps a declarative topology like:
///
/// ```toml
/// [workflow]
/// description = "support ticket routing"
/// start = "analyze"
///
/// [node.analyze]
/// successors = ["route"]
///
/// [node.route]
/// router = true
/// successors = ["respond", "escalate"]
/// ```
///
/// Only the *topology* lives in the file; node bodies are still supplied
/// at runtime through a `NodeRegistry`.
#[derive(Debug, Clone, Deserialize)]
struct SchemaFile {
    workflow: WorkflowSection,

    /// All nodes from `[node.<id>]`. Keys are the node identities.
    #[serde(default)]
    node: BTreeMap<String, NodeSection>,
}

/// `[workflow]` section.
#[derive(Debug, Clone, Deserialize)]
struct WorkflowSection {
    start: String,

    #[serde(default)]
    description: Option<String>,
}

/// `[node.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
struct NodeSection {
    #[serde(default)]
    successors: Vec<String>,

    #[serde(default)]
    router: bool,

    #[serde(default)]
    fan_out: bool,

    #[serde(default)]
    concurrent_children: Vec<String>,

    #[serde(default)]
    description: Option<String>,
}

/// Load a schema topology from a TOML file.
///
/// This only performs deserialization; it does **not** run the DAG
/// validator. Use [`load_and_validate`] for that.
pub fn load_from_path<E>(path: impl AsRef<Path>) -> Result<WorkflowSchema<E>, ConfigurationError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let file: SchemaFile = toml::from_str(&contents)?;
    Ok(schema_from_file(file))
}

/// Load a schema topology from a TOML file and run static validation.
///
/// This is the recommended entry point when workflows are authored as
/// files rather than in code: the returned schema has passed the same
/// checks `Workflow::new` would apply.
pub fn load_and_validate<E>(
    path: impl AsRef<Path>,
) -> Result<WorkflowSchema<E>, ConfigurationError> {
    let schema = load_from_path(path)?;
    validate_schema(&schema)?;
    Ok(schema)
}

fn schema_from_file<E>(file: SchemaFile) -> WorkflowSchema<E> {
    let nodes = file
        .node
        .into_iter()
        .map(|(id, section)| NodeConfig {
            id: NodeId::new(id),
            successors: section.successors.into_iter().map(NodeId::new).collect(),
            is_router: section.router,
            is_fanout: section.fan_out,
            concurrent_children: section
                .concurrent_children
                .into_iter()
                .map(NodeId::new)
                .collect(),
            description: section.description,
        })
        .collect();

    let mut schema = WorkflowSchema::new(file.workflow.start, nodes);
    schema.description = file.workflow.description;
    schema
}
