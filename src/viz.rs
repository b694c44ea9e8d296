// src/viz.rs

//! Mermaid rendering of a workflow graph.
//!
//! Useful for documentation and for eyeballing a schema while authoring
//! it: paste the output into any Mermaid renderer.

use crate::engine::Workflow;

impl<E> Workflow<E> {
    /// Render the materialized graph as a Mermaid flowchart.
    ///
    /// Shapes: the start node is a stadium, routers are diamonds,
    /// fan-out nodes are subroutines, plain tasks are rectangles.
    /// Fan-out children hang off their parent with dashed edges.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");

        for (id, config) in &self.configs {
            let label = config.description.as_deref().unwrap_or(id.as_str());
            let shape = if *id == *self.start() {
                format!("{id}([\"{label}\"])")
            } else if config.is_router {
                format!("{id}{{\"{label}\"}}")
            } else if config.is_fanout {
                format!("{id}[[\"{label}\"]]")
            } else {
                format!("{id}[\"{label}\"]")
            };
            out.push_str("    ");
            out.push_str(&shape);
            out.push('\n');
        }

        for (id, config) in &self.configs {
            for next in &config.successors {
                out.push_str(&format!("    {id} --> {next}\n"));
            }
            for child in &config.concurrent_children {
                out.push_str(&format!("    {id} -.-> {child}\n"));
            }
        }

        out
    }
}
