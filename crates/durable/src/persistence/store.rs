//! `PersistenceStore` trait definition.
//!
//! An `async_trait` object that the rest of the crate only ever holds as
//! `Arc<dyn PersistenceStore>`. There is no event log, task queue, DLQ, or
//! circuit-breaker registry here — the memoization model this engine relies
//! on needs exactly the operations below, nothing more.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;

/// Workflow status. Variants serialize to the wire-stable snake_case strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Idle,
    Running,
    Failed,
    Finished,
    Aborted,
}

impl WorkflowStatus {
    /// Whether a workflow in this status is a candidate for `claim` once its
    /// lease has expired.
    pub fn is_reclaimable_kind(self) -> bool {
        matches!(self, WorkflowStatus::Running | WorkflowStatus::Failed)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Failed => write!(f, "failed"),
            Self::Finished => write!(f, "finished"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// The handler name, input, and failure count for a workflow — everything
/// `run` needs to begin an execution.
#[derive(Debug, Clone)]
pub struct RunData {
    pub handler: String,
    pub input: Value,
    pub failures: u32,
}

/// The operations the run engine, supervisor, workflow primitives, and
/// client surface require of a backing store. Any store able to provide
/// the stated atomicity on `claim` is a valid implementation — relational,
/// document, or KV-with-CAS.
///
/// `claim` is the only operation requiring compare-and-set semantics across
/// workers; the rest are made by whichever worker currently holds the
/// lease and need no cross-worker coordination.
#[async_trait]
pub trait PersistenceStore: Send + Sync + 'static {
    /// Create an `idle` workflow. `Ok(true)` on success, `Ok(false)` if `id`
    /// already exists. Any other failure is a `StoreError`.
    async fn insert(&self, id: &str, handler: &str, input: Value) -> Result<bool, StoreError>;

    /// Atomically select one workflow where `status = idle` or
    /// (`status` is `running`/`failed` and its `timeout_at < now`); set
    /// `status = running` and `timeout_at = timeout_at`; return its id.
    /// `Ok(None)` if no such workflow exists. Tie-breaking among multiple
    /// candidates is unspecified.
    async fn claim(
        &self,
        now: DateTime<Utc>,
        timeout_at: DateTime<Utc>,
    ) -> Result<Option<String>, StoreError>;

    /// The recorded output for `(workflow_id, step_id)`, if any.
    async fn find_output(
        &self,
        workflow_id: &str,
        step_id: &str,
    ) -> Result<Option<Value>, StoreError>;

    /// The recorded wake time for `(workflow_id, nap_id)`, if any.
    async fn find_wake_up_at(
        &self,
        workflow_id: &str,
        nap_id: &str,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// The handler, input, and failure count for `workflow_id`, if it exists.
    async fn find_run_data(&self, workflow_id: &str) -> Result<Option<RunData>, StoreError>;

    /// Set `status = finished`. Terminal: no further writes follow this call
    /// for the given workflow.
    async fn set_as_finished(&self, workflow_id: &str) -> Result<(), StoreError>;

    /// The current status, if the workflow exists.
    async fn find_status(&self, workflow_id: &str) -> Result<Option<WorkflowStatus>, StoreError>;

    /// Write status, lease, failure count, and last error together.
    async fn update_status(
        &self,
        workflow_id: &str,
        status: WorkflowStatus,
        timeout_at: DateTime<Utc>,
        failures: u32,
        last_error: Option<String>,
    ) -> Result<(), StoreError>;

    /// Create the step record and push `timeout_at` in one unit. A step id
    /// is created at most once per `(workflow_id, step_id)`; this method is
    /// only ever called once no record was found for that key.
    async fn update_output(
        &self,
        workflow_id: &str,
        step_id: &str,
        output: Value,
        timeout_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Create the nap record and set `timeout_at` in one unit. Like step
    /// records, a nap record is created at most once per
    /// `(workflow_id, nap_id)`.
    async fn update_wake_up_at(
        &self,
        workflow_id: &str,
        nap_id: &str,
        wake_up_at: DateTime<Utc>,
        timeout_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
