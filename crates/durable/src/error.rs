//! Error types for the durable execution core
//!
//! Each module boundary gets its own `thiserror` enum rather than one big
//! error type, so callers can match on exactly the failures that module can
//! produce. See spec.md §7 for the error kinds this maps onto.

/// Errors a [`crate::persistence::PersistenceStore`] implementation may
/// surface. All operations in the contract can fail this way; the core
/// never interprets the string, it only logs and propagates it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not complete the operation.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Error returned by a handler's body (including step and sleep bodies
/// run inside it). Carries enough context for `run` to render a
/// human-readable `lastError` string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Error surfaced by a handler's interaction with its [`crate::context::Context`].
///
/// A handler body built from `step`/`sleep`/`start`/`heartbeat` calls
/// (chained with `?`) resolves to this type rather than to `HandlerError`
/// directly, so `run` can tell the two failure origins apart: a
/// [`HandlerError`] is the user's own code failing, while a [`StoreError`]
/// is the persistence layer failing underneath a primitive. Per spec.md §7
/// these are absorbed very differently — collapsing them would let a
/// transient store hiccup consume a `maxFailures` slot and drive a workflow
/// to `aborted` for reasons that have nothing to do with the handler.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The handler's own logic failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// A persistence call underneath `step`/`sleep`/`start`/`heartbeat` failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from `run(workflow_id)` itself (engine.rs).
///
/// `HandlerError` and `StoreError` are *not* variants here: per spec.md §7,
/// a `HandlerError` is absorbed into stored workflow state (the engine
/// returns `Ok(())` after recording `failed`/`aborted`), and a `StoreError`
/// propagates as-is rather than being wrapped, since it carries no engine
/// semantics of its own.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `claim` returned an id that is absent from the store on re-read.
    /// Indicates store corruption — claim just proved the id existed.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// The workflow's `handler` name is not registered on this worker.
    #[error("handler not registered: {0}")]
    HandlerNotFound(String),

    /// A persistence call failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors surfaced by the client-facing `start`/`wait` operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A persistence call failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
