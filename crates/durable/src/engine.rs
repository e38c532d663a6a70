//! Run engine — component D, spec.md §4.4
//!
//! `run(workflow_id)` loads run data, resolves the handler, constructs a
//! [`Context`], invokes the handler, and finalizes the workflow. A
//! `HandlerError` from the handler's own logic is absorbed into stored state
//! (`failed`/`aborted`); store corruption (`WorkflowNotFound`),
//! misconfiguration (`HandlerNotFound`), and a `StoreError` surfacing from
//! underneath `step`/`sleep`/`start`/`heartbeat` all propagate out of `run`
//! itself instead, matching the error table in spec.md §7.
//!
//! Logging follows the teacher's `engine/executor.rs`: `#[instrument]` on
//! the entry point, `info!`/`warn!`/`error!` at each state transition.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::clock::SharedClock;
use crate::config::EngineConfig;
use crate::context::Context;
use crate::error::{EngineError, WorkflowError};
use crate::persistence::{PersistenceStore, WorkflowStatus};
use crate::registry::HandlerRegistry;

/// Drives a single workflow execution to completion or to a recorded
/// failure/abort. Never panics on handler errors — those are translated to
/// store state and swallowed, per spec.md §4.4 step 5.
#[instrument(skip(store, clock, registry, config), fields(%workflow_id))]
pub async fn run(
    workflow_id: &str,
    store: &Arc<dyn PersistenceStore>,
    clock: &SharedClock,
    registry: &HandlerRegistry,
    config: &EngineConfig,
) -> Result<(), EngineError> {
    let run_data = store
        .find_run_data(workflow_id)
        .await?
        .ok_or_else(|| EngineError::WorkflowNotFound(workflow_id.to_string()))?;

    let handler = registry
        .get(&run_data.handler)
        .ok_or_else(|| EngineError::HandlerNotFound(run_data.handler.clone()))?;

    let ctx = Context::new(
        workflow_id,
        store.clone(),
        clock.clone(),
        config.timeout_interval,
    );

    match handler(ctx, run_data.input).await {
        Ok(_) => {
            store.set_as_finished(workflow_id).await?;
            info!("workflow finished");
            Ok(())
        }
        // A store failure underneath step/sleep/start/heartbeat is not the
        // handler's fault: it propagates untouched, with no updateStatus
        // call and no failure-count increment, so the workflow is left
        // exactly as claim left it and its lease simply expires for another
        // worker to retry (spec.md §7).
        Err(WorkflowError::Store(store_err)) => {
            warn!(error = %store_err, "store error inside handler, leaving lease to expire for retry");
            Err(EngineError::Store(store_err))
        }
        Err(WorkflowError::Handler(handler_err)) => {
            let last_error = handler_err.to_string();
            let failures = run_data.failures + 1;
            let (status, timeout_at) = if failures < config.max_failures {
                (WorkflowStatus::Failed, clock.now() + config.retry_interval)
            } else {
                (WorkflowStatus::Aborted, clock.now() + config.retry_interval)
            };

            store
                .update_status(
                    workflow_id,
                    status,
                    timeout_at,
                    failures,
                    Some(last_error.clone()),
                )
                .await?;

            if status == WorkflowStatus::Aborted {
                error!(%last_error, failures, "workflow aborted after exhausting retries");
            } else {
                warn!(%last_error, failures, "workflow attempt failed, will retry");
            }
            Ok(())
        }
    }
}
