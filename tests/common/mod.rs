// tests/common/mod.rs

//! Shared helpers for integration tests: a simple typed event, plus
//! task-node implementations that record the order they were visited in.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use flowdag::{NodeRegistry, TaskContext, TaskNode};

/// Event type used across the tests.
#[derive(Debug, Clone, Deserialize)]
pub struct FlagEvent {
    pub flag: bool,
}

/// Shared log of visited node names, in execution order.
pub type VisitLog = Arc<Mutex<Vec<String>>>;

pub fn new_visit_log() -> VisitLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn visited(log: &VisitLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Task node that records its visit and writes `visited: true` into its
/// own result record.
pub struct RecordingNode {
    pub name: &'static str,
    pub log: VisitLog,
}

#[async_trait]
impl TaskNode<FlagEvent> for RecordingNode {
    async fn process(
        &self,
        mut ctx: TaskContext<FlagEvent>,
    ) -> anyhow::Result<TaskContext<FlagEvent>> {
        self.log.lock().unwrap().push(self.name.to_string());
        ctx.update_field(self.name, "visited", json!(true));
        Ok(ctx)
    }
}

/// Task node that records its visit and then sets the stop flag.
pub struct StoppingNode {
    pub name: &'static str,
    pub log: VisitLog,
}

#[async_trait]
impl TaskNode<FlagEvent> for StoppingNode {
    async fn process(
        &self,
        mut ctx: TaskContext<FlagEvent>,
    ) -> anyhow::Result<TaskContext<FlagEvent>> {
        self.log.lock().unwrap().push(self.name.to_string());
        ctx.update_field(self.name, "visited", json!(true));
        ctx.stop();
        Ok(ctx)
    }
}

/// Task node that records its visit and then fails.
pub struct FailingNode {
    pub name: &'static str,
    pub log: VisitLog,
}

#[async_trait]
impl TaskNode<FlagEvent> for FailingNode {
    async fn process(
        &self,
        _ctx: TaskContext<FlagEvent>,
    ) -> anyhow::Result<TaskContext<FlagEvent>> {
        self.log.lock().unwrap().push(self.name.to_string());
        anyhow::bail!("{} exploded", self.name)
    }
}

pub fn register_recording(
    registry: &mut NodeRegistry<FlagEvent>,
    name: &'static str,
    log: &VisitLog,
) {
    let log = log.clone();
    registry.register_task(name, move || RecordingNode {
        name,
        log: log.clone(),
    });
}

pub fn register_stopping(
    registry: &mut NodeRegistry<FlagEvent>,
    name: &'static str,
    log: &VisitLog,
) {
    let log = log.clone();
    registry.register_task(name, move || StoppingNode {
        name,
        log: log.clone(),
    });
}

/// Task node that records its visit and writes outside its own record:
/// one field named after itself into a shared record, plus a metadata
/// entry under its own name.
pub struct AnnotatingNode {
    pub name: &'static str,
    pub target: &'static str,
    pub log: VisitLog,
}

#[async_trait]
impl TaskNode<FlagEvent> for AnnotatingNode {
    async fn process(
        &self,
        mut ctx: TaskContext<FlagEvent>,
    ) -> anyhow::Result<TaskContext<FlagEvent>> {
        self.log.lock().unwrap().push(self.name.to_string());
        ctx.update_field(self.name, "visited", json!(true));
        ctx.update_field(self.target, self.name, json!("seen"));
        ctx.metadata.insert(self.name.to_string(), json!("seen"));
        Ok(ctx)
    }
}

pub fn register_failing(
    registry: &mut NodeRegistry<FlagEvent>,
    name: &'static str,
    log: &VisitLog,
) {
    let log = log.clone();
    registry.register_task(name, move || FailingNode {
        name,
        log: log.clone(),
    });
}

pub fn register_annotating(
    registry: &mut NodeRegistry<FlagEvent>,
    name: &'static str,
    target: &'static str,
    log: &VisitLog,
) {
    let log = log.clone();
    registry.register_task(name, move || AnnotatingNode {
        name,
        target,
        log: log.clone(),
    });
}
