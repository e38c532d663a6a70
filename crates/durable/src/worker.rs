//! Supervisor: the polling loop that feeds the run engine.
//!
//! Owns the poll loop: claim, fire-and-forget dispatch of `run`, idle sleep
//! when nothing is claimable. Bounded concurrency and in-flight tracking use
//! a `tokio::sync::Semaphore` to cap concurrent `run`s, and a `JoinSet`
//! tracks them so a caller can drain on shutdown instead of abandoning them.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument, warn};

use crate::clock::SharedClock;
use crate::config::EngineConfig;
use crate::engine;
use crate::persistence::PersistenceStore;
use crate::registry::HandlerRegistry;

/// The polling supervisor. One `Worker` can feed many concurrent `run`
/// invocations; multiple `Worker`s (in one process or many) may share the
/// same store safely — all coordination lives in the store's `claim`.
pub struct Worker {
    store: Arc<dyn PersistenceStore>,
    clock: SharedClock,
    registry: Arc<HandlerRegistry>,
    config: EngineConfig,
}

impl Worker {
    pub fn new(
        store: Arc<dyn PersistenceStore>,
        clock: SharedClock,
        registry: HandlerRegistry,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            clock,
            registry: Arc::new(registry),
            config,
        }
    }

    /// Run the poll loop until `should_stop` returns `true`.
    ///
    /// `should_stop` is evaluated at the top of every iteration. In-flight
    /// `run` calls are never forcibly cancelled on stop, they are drained —
    /// either they complete, or their lease expires and another worker
    /// takes over.
    #[instrument(skip_all)]
    pub async fn poll(&self, mut should_stop: impl FnMut() -> bool) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            if should_stop() {
                debug!("stop requested, draining in-flight runs");
                break;
            }

            // Reap finished tasks opportunistically so the set doesn't grow
            // without bound across a long-running poll loop.
            while in_flight.try_join_next().is_some() {}

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");

            let now = self.clock.now();
            let timeout_at = now + self.config.timeout_interval;

            match self.store.claim(now, timeout_at).await {
                Ok(Some(workflow_id)) => {
                    let store = self.store.clone();
                    let clock = self.clock.clone();
                    let registry = self.registry.clone();
                    let config = self.config.clone();
                    in_flight.spawn(async move {
                        let _permit = permit;
                        if let Err(err) =
                            engine::run(&workflow_id, &store, &clock, &registry, &config).await
                        {
                            error!(%workflow_id, %err, "run failed fatally");
                        }
                    });
                }
                Ok(None) => {
                    drop(permit);
                    self.clock.delay(self.config.poll_interval).await;
                }
                Err(err) => {
                    drop(permit);
                    warn!(%err, "claim failed, backing off for one poll interval");
                    self.clock.delay(self.config.poll_interval).await;
                }
            }
        }

        while in_flight.join_next().await.is_some() {}
    }
}
