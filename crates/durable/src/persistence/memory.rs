//! In-memory `PersistenceStore` — reference implementation and test substrate
//!
//! A `parking_lot::RwLock<HashMap<_>>` per entity kind, with no cross-entity
//! locking beyond what each operation needs. `claim` takes the workflows
//! write lock for its whole scan-and-set, which is the one place the
//! contract requires compare-and-set semantics.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;

use super::store::{PersistenceStore, RunData, WorkflowStatus};
use crate::error::StoreError;

struct WorkflowState {
    handler: String,
    input: Value,
    status: WorkflowStatus,
    timeout_at: Option<DateTime<Utc>>,
    failures: u32,
    last_error: Option<String>,
}

/// In-memory implementation of [`PersistenceStore`].
///
/// Intended for the crate's own test suite and as a starting point for
/// embedding applications before they wire up a durable backend. It
/// provides the same atomicity guarantees the trait requires, but data
/// does not survive process restart — which defeats the point of a
/// *durable* workflow engine in production use.
pub struct InMemoryStore {
    workflows: RwLock<HashMap<String, WorkflowState>>,
    steps: RwLock<HashMap<(String, String), Value>>,
    naps: RwLock<HashMap<(String, String), DateTime<Utc>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            workflows: RwLock::new(HashMap::new()),
            steps: RwLock::new(HashMap::new()),
            naps: RwLock::new(HashMap::new()),
        }
    }

    /// Number of workflow records currently stored. Test/diagnostic helper.
    pub fn workflow_count(&self) -> usize {
        self.workflows.read().len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceStore for InMemoryStore {
    async fn insert(&self, id: &str, handler: &str, input: Value) -> Result<bool, StoreError> {
        let mut workflows = self.workflows.write();
        if workflows.contains_key(id) {
            return Ok(false);
        }
        workflows.insert(
            id.to_string(),
            WorkflowState {
                handler: handler.to_string(),
                input,
                status: WorkflowStatus::Idle,
                timeout_at: None,
                failures: 0,
                last_error: None,
            },
        );
        Ok(true)
    }

    async fn claim(
        &self,
        now: DateTime<Utc>,
        timeout_at: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError> {
        let mut workflows = self.workflows.write();
        let ready_id = workflows
            .iter()
            .find(|(_, w)| {
                w.status == WorkflowStatus::Idle
                    || (w.status.is_reclaimable_kind() && w.timeout_at.is_some_and(|t| t < now))
            })
            .map(|(id, _)| id.clone());

        if let Some(id) = &ready_id {
            let workflow = workflows.get_mut(id).expect("id came from this map");
            workflow.status = WorkflowStatus::Running;
            workflow.timeout_at = Some(timeout_at);
        }
        Ok(ready_id)
    }

    async fn find_output(
        &self,
        workflow_id: &str,
        step_id: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self
            .steps
            .read()
            .get(&(workflow_id.to_string(), step_id.to_string()))
            .cloned())
    }

    async fn find_wake_up_at(
        &self,
        workflow_id: &str,
        nap_id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .naps
            .read()
            .get(&(workflow_id.to_string(), nap_id.to_string()))
            .copied())
    }

    async fn find_run_data(&self, workflow_id: &str) -> Result<Option<RunData>, StoreError> {
        Ok(self.workflows.read().get(workflow_id).map(|w| RunData {
            handler: w.handler.clone(),
            input: w.input.clone(),
            failures: w.failures,
        }))
    }

    async fn set_as_finished(&self, workflow_id: &str) -> Result<(), StoreError> {
        let mut workflows = self.workflows.write();
        let workflow = workflows
            .get_mut(workflow_id)
            .ok_or_else(|| StoreError::backend(format!("unknown workflow: {workflow_id}")))?;
        workflow.status = WorkflowStatus::Finished;
        Ok(())
    }

    async fn find_status(&self, workflow_id: &str) -> Result<Option<WorkflowStatus>, StoreError> {
        Ok(self.workflows.read().get(workflow_id).map(|w| w.status))
    }

    async fn update_status(
        &self,
        workflow_id: &str,
        status: WorkflowStatus,
        timeout_at: DateTime<Utc>,
        failures: u32,
        last_error: Option<String>,
    ) -> Result<(), StoreError> {
        let mut workflows = self.workflows.write();
        let workflow = workflows
            .get_mut(workflow_id)
            .ok_or_else(|| StoreError::backend(format!("unknown workflow: {workflow_id}")))?;
        workflow.status = status;
        workflow.timeout_at = Some(timeout_at);
        workflow.failures = failures;
        workflow.last_error = last_error;
        Ok(())
    }

    async fn update_output(
        &self,
        workflow_id: &str,
        step_id: &str,
        output: Value,
        timeout_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.steps
            .write()
            .entry((workflow_id.to_string(), step_id.to_string()))
            .or_insert(output);
        let mut workflows = self.workflows.write();
        let workflow = workflows
            .get_mut(workflow_id)
            .ok_or_else(|| StoreError::backend(format!("unknown workflow: {workflow_id}")))?;
        workflow.timeout_at = Some(timeout_at);
        Ok(())
    }

    async fn update_wake_up_at(
        &self,
        workflow_id: &str,
        nap_id: &str,
        wake_up_at: DateTime<Utc>,
        timeout_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.naps
            .write()
            .entry((workflow_id.to_string(), nap_id.to_string()))
            .or_insert(wake_up_at);
        let mut workflows = self.workflows.write();
        let workflow = workflows
            .get_mut(workflow_id)
            .ok_or_else(|| StoreError::backend(format!("unknown workflow: {workflow_id}")))?;
        workflow.timeout_at = Some(timeout_at);
        Ok(())
    }
}
