//! Workflow primitives exposed to handlers: `step`, `sleep`, `start`.
//!
//! A [`Context`] is constructed once per `run` invocation and carries the
//! workflow id through every `step`/`sleep`/`start` call a handler makes.
//! It is cheap to clone (an `Arc`-backed handle) so a handler may pass it
//! into helper functions freely.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::clock::SharedClock;
use crate::error::{HandlerError, WorkflowError};
use crate::persistence::PersistenceStore;

/// Per-execution handle exposing the three primitives granted to user
/// handlers: `step`, `sleep`, and `start`.
#[derive(Clone)]
pub struct Context {
    workflow_id: Arc<str>,
    store: Arc<dyn PersistenceStore>,
    clock: SharedClock,
    timeout_interval: Duration,
}

impl Context {
    pub(crate) fn new(
        workflow_id: impl Into<Arc<str>>,
        store: Arc<dyn PersistenceStore>,
        clock: SharedClock,
        timeout_interval: Duration,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            store,
            clock,
            timeout_interval,
        }
    }

    /// The id of the workflow this context is bound to.
    pub fn workflow_id(&self) -> &str {
        &self.workflow_id
    }

    /// Memoized execution: if `(workflow_id, id)` already has a recorded
    /// output, return it without invoking `f`. Otherwise invoke `f`, persist
    /// its output with a refreshed lease, and return it.
    ///
    /// If `f` fails, the failure propagates out of `step` and no record is
    /// written — a later replay re-invokes `f`. Step bodies are therefore
    /// *at least once*; their recorded output is *at most once*
    /// (spec.md §5).
    ///
    /// `f`'s own failures surface as [`WorkflowError::Handler`]; a failure
    /// reading or writing the step record surfaces as
    /// [`WorkflowError::Store`] instead — `run` treats the two very
    /// differently (spec.md §7).
    #[instrument(skip(self, f), fields(workflow_id = %self.workflow_id, step_id = %id))]
    pub async fn step<F, Fut>(&self, id: &str, f: F) -> Result<Value, WorkflowError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, HandlerError>>,
    {
        if let Some(output) = self.store.find_output(&self.workflow_id, id).await? {
            debug!("step already recorded, skipping body");
            return Ok(output);
        }

        let output = f().await?;

        let timeout_at = self.clock.now() + self.timeout_interval;
        self.store
            .update_output(&self.workflow_id, id, output.clone(), timeout_at)
            .await?;

        Ok(output)
    }

    /// Durable delay: records the wake-up instant *before* sleeping so a
    /// crash mid-sleep loses at most the remaining wall-clock wait, not the
    /// whole delay (spec.md §9). A replay that finds the nap already past
    /// returns immediately instead of re-sleeping.
    #[instrument(skip(self), fields(workflow_id = %self.workflow_id, nap_id = %id))]
    pub async fn sleep(&self, id: &str, duration: Duration) -> Result<(), WorkflowError> {
        let now = self.clock.now();

        let wake_up_at = match self.store.find_wake_up_at(&self.workflow_id, id).await? {
            Some(existing) => existing,
            None => {
                let wake_up_at = now
                    + chrono::Duration::from_std(duration).map_err(|e| {
                        HandlerError::new(format!("sleep duration out of range: {e}"))
                    })?;
                let timeout_at = wake_up_at + self.timeout_interval;
                self.store
                    .update_wake_up_at(&self.workflow_id, id, wake_up_at, timeout_at)
                    .await?;
                wake_up_at
            }
        };

        let remaining = wake_up_at - self.clock.now();
        if remaining > chrono::Duration::zero() {
            let remaining = remaining.to_std().unwrap_or(Duration::ZERO);
            self.clock.delay(remaining).await;
        }
        Ok(())
    }

    /// Insert a new, independent workflow. Identical to the top-level
    /// client `start` — there is no parent/child link (spec.md §1, §4.3).
    #[instrument(skip(self, input), fields(workflow_id = %self.workflow_id, new_handler = %handler))]
    pub async fn start(
        &self,
        id: &str,
        handler: &str,
        input: Value,
    ) -> Result<bool, WorkflowError> {
        Ok(self.store.insert(id, handler, input).await?)
    }

    /// Refresh this workflow's lease without writing a step or nap record.
    ///
    /// spec.md §9 leaves periodic lease refresh for long-running step bodies
    /// as an open question and explicitly permits an implementation to add a
    /// heartbeat helper "without altering the contract". This is that
    /// helper: it pushes `timeout_at` forward by `timeout_interval`, the
    /// same refresh every step/sleep write already performs, so a step body
    /// that does a lot of work between `step` boundaries can call it to
    /// avoid losing its lease to another worker mid-step.
    #[instrument(skip(self), fields(workflow_id = %self.workflow_id))]
    pub async fn heartbeat(&self) -> Result<(), WorkflowError> {
        let run_data = self
            .store
            .find_run_data(&self.workflow_id)
            .await?
            .ok_or_else(|| HandlerError::new("heartbeat on unknown workflow"))?;

        let timeout_at = self.clock.now() + self.timeout_interval;
        self.store
            .update_status(
                &self.workflow_id,
                crate::persistence::WorkflowStatus::Running,
                timeout_at,
                run_data.failures,
                None,
            )
            .await?;
        Ok(())
    }
}
