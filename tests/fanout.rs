// tests/fanout.rs

//! Fan-out/join semantics: all siblings launch together, the group is
//! all-or-nothing, and each sibling's full delta (result records,
//! metadata, stop flag) is merged back on success.

mod common;

use std::collections::HashSet;
use std::error::Error;

use common::{
    new_visit_log, register_annotating, register_failing, register_recording, register_stopping,
    visited, FlagEvent,
};
use flowdag::{
    ExecutionError, NodeConfig, NodeId, NodeRegistry, Workflow, WorkflowError, WorkflowSchema,
};
use serde_json::json;

type TestResult = Result<(), Box<dyn Error>>;

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

fn fanout_schema() -> WorkflowSchema<FlagEvent> {
    WorkflowSchema::new(
        "F",
        vec![
            NodeConfig::fan_out("F", [id("X"), id("Y"), id("Z")]).successor("after"),
            NodeConfig::task("after"),
        ],
    )
}

#[tokio::test]
async fn all_siblings_succeed_and_merge_one_record_each() -> TestResult {
    let log = new_visit_log();
    let mut registry = NodeRegistry::new();
    register_recording(&mut registry, "F", &log);
    register_recording(&mut registry, "X", &log);
    register_recording(&mut registry, "Y", &log);
    register_recording(&mut registry, "Z", &log);
    register_recording(&mut registry, "after", &log);

    let workflow = Workflow::new(fanout_schema(), registry)?;
    let ctx = workflow.run(json!({"flag": true})).await?;

    // Relative order among siblings is unspecified; all of them run
    // before the fan-out node's own process, which runs before "after".
    let seen = visited(&log);
    assert_eq!(seen.len(), 5);
    let siblings: HashSet<&str> = seen[..3].iter().map(|s| s.as_str()).collect();
    assert_eq!(siblings, HashSet::from(["X", "Y", "Z"]));
    assert_eq!(&seen[3..], ["F", "after"]);

    for name in ["X", "Y", "Z", "F", "after"] {
        let record = ctx.result(&id(name)).expect("record present");
        assert_eq!(record.get("visited"), Some(&json!(true)));
    }
    Ok(())
}

#[tokio::test]
async fn one_failing_sibling_fails_the_group_and_the_run() -> TestResult {
    let log = new_visit_log();
    let mut registry = NodeRegistry::new();
    register_recording(&mut registry, "F", &log);
    register_recording(&mut registry, "X", &log);
    register_failing(&mut registry, "Y", &log);
    register_recording(&mut registry, "Z", &log);
    register_recording(&mut registry, "after", &log);

    let workflow = Workflow::new(fanout_schema(), registry)?;
    let err = workflow.run(json!({"flag": true})).await.unwrap_err();

    match err {
        WorkflowError::Execution(ExecutionError::Node { node, .. }) => {
            assert_eq!(node, id("Y"));
        }
        other => panic!("expected sibling failure, got: {other}"),
    }

    // The fold step and the successor never run after a failed group.
    let seen = visited(&log);
    assert!(!seen.contains(&"F".to_string()));
    assert!(!seen.contains(&"after".to_string()));
    Ok(())
}

#[tokio::test]
async fn sibling_mutations_stay_isolated_until_the_join() -> TestResult {
    // Siblings run against cloned snapshots: a record written by one
    // sibling is not visible to another mid-flight, only the final
    // merged context carries all of them.
    let log = new_visit_log();
    let mut registry = NodeRegistry::new();
    register_recording(&mut registry, "F", &log);
    register_recording(&mut registry, "X", &log);
    register_recording(&mut registry, "Y", &log);

    let schema: WorkflowSchema<FlagEvent> =
        WorkflowSchema::new("F", vec![NodeConfig::fan_out("F", [id("X"), id("Y")])]);
    let workflow = Workflow::new(schema, registry)?;
    let ctx = workflow.run(json!({"flag": true})).await?;

    // Exactly one record per sibling plus the fan-out node itself.
    assert_eq!(ctx.results().len(), 3);
    assert!(ctx.result(&id("X")).is_some());
    assert!(ctx.result(&id("Y")).is_some());
    assert!(ctx.result(&id("F")).is_some());
    Ok(())
}

#[tokio::test]
async fn sibling_stop_flag_halts_the_run_after_the_join() -> TestResult {
    let log = new_visit_log();
    let mut registry = NodeRegistry::new();
    register_recording(&mut registry, "F", &log);
    register_stopping(&mut registry, "X", &log);
    register_recording(&mut registry, "Y", &log);
    register_recording(&mut registry, "Z", &log);
    register_recording(&mut registry, "after", &log);

    let workflow = Workflow::new(fanout_schema(), registry)?;
    let ctx = workflow.run(json!({"flag": true})).await?;

    // The fan-out node was already executing when X requested the stop,
    // so its fold step completes; the successor never starts.
    let seen = visited(&log);
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[3], "F");
    assert!(!seen.contains(&"after".to_string()));

    assert!(ctx.is_stopped());
    assert!(ctx.result(&id("after")).is_none());
    Ok(())
}

#[tokio::test]
async fn sibling_writes_outside_their_own_record_survive_the_join() -> TestResult {
    let log = new_visit_log();
    let mut registry = NodeRegistry::new();
    register_recording(&mut registry, "F", &log);
    register_annotating(&mut registry, "X", "audit", &log);
    register_annotating(&mut registry, "Y", "audit", &log);
    register_recording(&mut registry, "after", &log);

    let schema: WorkflowSchema<FlagEvent> = WorkflowSchema::new(
        "F",
        vec![
            NodeConfig::fan_out("F", [id("X"), id("Y")]).successor("after"),
            NodeConfig::task("after"),
        ],
    );
    let workflow = Workflow::new(schema, registry)?;
    let ctx = workflow.run(json!({"flag": true})).await?;

    // Each sibling wrote one disjoint field into the shared "audit"
    // record; both survive the merge.
    let audit = ctx.result(&id("audit")).expect("shared record present");
    assert_eq!(audit.get("X"), Some(&json!("seen")));
    assert_eq!(audit.get("Y"), Some(&json!("seen")));

    // Sibling metadata entries are carried over as well.
    assert_eq!(ctx.metadata.get("X"), Some(&json!("seen")));
    assert_eq!(ctx.metadata.get("Y"), Some(&json!("seen")));
    Ok(())
}
