//! Handler registry — spec.md §6
//!
//! A type-erased map from handler name to callable, registered once at
//! worker construction and read-only thereafter. Grounded in the teacher's
//! `ActivityHandler` type alias and `register_handler` (`worker/pool.rs`),
//! generalized from "activity task in" to "this crate's `(Context, Value)`
//! in".

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::context::Context;
use crate::error::WorkflowError;

/// A registered handler: `(ctx, opaque input) -> result/error`.
///
/// The error type is [`WorkflowError`], not `HandlerError`: a handler body
/// is built from `step`/`sleep`/`start` calls chained with `?`, and those
/// can fail either because the handler's own logic failed or because the
/// store underneath a primitive failed — `run` needs to tell the two apart
/// (spec.md §7).
pub type Handler =
    Arc<dyn Fn(Context, Value) -> BoxFuture<'static, Result<Value, WorkflowError>> + Send + Sync>;

/// Read-only (after construction) map from handler name to [`Handler`].
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under `name`. Registering the same name twice
    /// replaces the previous handler — there is no uniqueness check, since
    /// this happens once at worker construction under the embedding
    /// application's own control.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Context, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, WorkflowError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx, input| Box::pin(handler(ctx, input)));
        self.handlers.insert(name.into(), handler);
    }

    /// Look up a handler by name.
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }
}
