//! Client surface — component F, spec.md §4.6
//!
//! `Client` is the handle external callers use to submit workflows and
//! observe terminal status. It shares the same persistence contract as the
//! run engine and supervisor, but never claims or executes anything itself.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::instrument;

use crate::clock::SharedClock;
use crate::error::ClientError;
use crate::persistence::{PersistenceStore, WorkflowStatus};

/// Client-facing handle over a [`PersistenceStore`].
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn PersistenceStore>,
    clock: SharedClock,
}

impl Client {
    pub fn new(store: Arc<dyn PersistenceStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Thin wrapper over `insert`. Returns `true` when freshly created,
    /// `false` when `id` already existed.
    #[instrument(skip(self, input), fields(%id, %handler))]
    pub async fn start(
        &self,
        id: &str,
        handler: &str,
        input: Value,
    ) -> Result<bool, ClientError> {
        Ok(self.store.insert(id, handler, input).await?)
    }

    /// Poll `findStatus` up to `times` times with a delay of `ms` between
    /// attempts; return the first status found in `status_set`, or `None`
    /// if no match within the budget. Advisory only — there is no push
    /// notification from the engine to the client.
    #[instrument(skip(self, status_set), fields(%id, times, ?ms))]
    pub async fn wait(
        &self,
        id: &str,
        status_set: &HashSet<WorkflowStatus>,
        times: u32,
        ms: std::time::Duration,
    ) -> Result<Option<WorkflowStatus>, ClientError> {
        for attempt in 0..times {
            if attempt > 0 {
                self.clock.delay(ms).await;
            }
            if let Some(status) = self.store.find_status(id).await? {
                if status_set.contains(&status) {
                    return Ok(Some(status));
                }
            }
        }
        Ok(None)
    }
}
