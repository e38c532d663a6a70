//! # Durable Workflow Execution Core
//!
//! A storage-agnostic engine for durable workflow execution: application
//! handlers are interrupted by crashes, timeouts, and restarts, yet always
//! resume to completion (or a bounded failure) with every
//! externally-observable effect recorded at-most-once across the workflow's
//! full lifetime.
//!
//! ## Primitives
//!
//! Handlers are given a [`Context`] exposing three primitives:
//!
//! - **`step`** — memoized execution. The first successful run records its
//!   output; every replay returns that output without re-invoking the body.
//! - **`sleep`** — durable delay. The wake-up instant is recorded before the
//!   wait, so a crash mid-sleep loses at most the remaining wall-clock time.
//! - **`start`** — submit a new, independent workflow.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Worker                               │
//! │   (polls PersistenceStore::claim, fire-and-forget dispatch)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      engine::run                              │
//! │  (load run data, build Context, invoke handler, finalize)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PersistenceStore                         │
//! │  (opaque sink/source: workflow/step/nap records)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use dura::prelude::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store: Arc<dyn PersistenceStore> = Arc::new(InMemoryStore::new());
//! let clock: SharedClock = Arc::new(SystemClock);
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("greet", |ctx, input| async move {
//!     let name = input.as_str().unwrap_or_default().to_string();
//!     ctx.step("say-hello", || async move {
//!         Ok(serde_json::json!(format!("hello, {name}")))
//!     }).await
//! });
//!
//! let client = Client::new(store.clone(), clock.clone());
//! client.start("w1", "greet", serde_json::json!("world")).await?;
//!
//! let worker = Worker::new(store, clock, registry, EngineConfig::default());
//! let mut ticks = 0;
//! worker.poll(|| { ticks += 1; ticks > 1 }).await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod worker;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::clock::{Clock, SharedClock, SystemClock};
    pub use crate::config::EngineConfig;
    pub use crate::context::Context;
    pub use crate::engine::run;
    pub use crate::error::{ClientError, EngineError, HandlerError, StoreError, WorkflowError};
    pub use crate::persistence::{InMemoryStore, PersistenceStore, RunData, WorkflowStatus};
    pub use crate::registry::{Handler, HandlerRegistry};
    pub use crate::worker::Worker;
}

pub use client::Client;
pub use clock::{Clock, SharedClock, SystemClock};
pub use config::EngineConfig;
pub use context::Context;
pub use error::{ClientError, EngineError, HandlerError, StoreError, WorkflowError};
pub use persistence::{InMemoryStore, PersistenceStore, RunData, WorkflowStatus};
pub use registry::{Handler, HandlerRegistry};
pub use worker::Worker;
