//! Action dispatcher
//!
//! Entry point of the engine. Looks up the program for an action id, picks
//! the caller's override set and runs the program's sequences.
//!
//! # Example
//!
//! ```rust,ignore
//! use action_core::executor::DispatcherBuilder;
//! use action_core::types::{DispatchContext, DispatchRequest};
//!
//! let dispatcher = DispatcherBuilder::new().store(store).build();
//! let request = DispatchRequest::new(DispatchContext::widget("w1"), json!({}));
//! let outcome = dispatcher.dispatch("submit", request).await;
//! ```

use serde_json::Value as JsonValue;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::Instrument;

use super::errors::ActionError;
use super::host::{AsyncDispatch, MethodContext, MethodRegistry};
use super::program::{run_program, DispatchOutcome, RunEnv};
use crate::config::EngineConfig;
use crate::store::{ActionStore, MemoryValueStore, OverrideStore, ValueStore};
use crate::types::{DispatchContext, DispatchRequest, Override};

/// Boxed future returned by `run_action`, needed because dispatch can recurse
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Executes actions against a loaded store
///
/// Every dispatch owns its own run-state; the dispatcher itself only holds
/// shared, read-mostly data and can be used from many tasks at once.
pub struct Dispatcher {
    store: Arc<ActionStore>,
    overrides: Arc<OverrideStore>,
    values: Arc<dyn ValueStore>,
    remote: Option<Arc<dyn AsyncDispatch>>,
    methods: MethodRegistry,
    config: EngineConfig,
}

impl Dispatcher {
    /// Dispatch an action, logging and swallowing an unknown action id
    ///
    /// Returns `None` when the action does not exist. Failures inside the
    /// action are reported through `DispatchOutcome::error`.
    pub async fn dispatch(&self, action_id: &str, request: DispatchRequest) -> Option<DispatchOutcome> {
        match self.try_dispatch(action_id, request).await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::error!(action_id, code = err.code(), error = %err, "Dispatch failed");
                None
            }
        }
    }

    /// Dispatch an action, surfacing lookup failures as errors
    pub async fn try_dispatch(
        &self,
        action_id: &str,
        request: DispatchRequest,
    ) -> Result<DispatchOutcome, ActionError> {
        let DispatchRequest { context, payload } = request;
        self.run_action(action_id, &context, &payload, 0).await
    }

    /// Run one action at the given nesting depth
    pub fn run_action<'a>(
        &'a self,
        action_id: &'a str,
        context: &'a DispatchContext,
        payload: &'a JsonValue,
        depth: usize,
    ) -> BoxFuture<'a, Result<DispatchOutcome, ActionError>> {
        let span = tracing::info_span!("dispatch", action_id, depth);

        Box::pin(
            async move {
                if depth > self.config.max_dispatch_depth {
                    return Err(ActionError::DispatchDepthExceeded {
                        limit: self.config.max_dispatch_depth,
                    });
                }

                let program = self.store.action(action_id).ok_or_else(|| {
                    ActionError::ActionNotFound {
                        action_id: action_id.to_string(),
                    }
                })?;

                let overrides: Arc<Vec<Override>> =
                    self.overrides.get(context.override_group(), action_id);

                let env = RunEnv {
                    dispatcher: self,
                    action_id,
                    context,
                    context_value: context.to_value(),
                    payload,
                    overrides,
                    depth,
                };

                tracing::debug!(sequences = program.len(), "Dispatching action");
                let outcome = run_program(&env, &program).await;
                tracing::debug!(ok = outcome.is_ok(), results = outcome.results.len(), "Action finished");

                Ok(outcome)
            }
            .instrument(span),
        )
    }

    pub fn store(&self) -> &ActionStore {
        &self.store
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    pub fn values(&self) -> &dyn ValueStore {
        self.values.as_ref()
    }

    pub fn async_dispatch(&self) -> Option<&dyn AsyncDispatch> {
        self.remote.as_deref()
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Builder for constructing a `Dispatcher`
pub struct DispatcherBuilder {
    store: Arc<ActionStore>,
    overrides: Arc<OverrideStore>,
    values: Option<Arc<dyn ValueStore>>,
    remote: Option<Arc<dyn AsyncDispatch>>,
    methods: MethodRegistry,
    config: EngineConfig,
}

impl DispatcherBuilder {
    /// Create a new builder over an empty store
    pub fn new() -> Self {
        Self {
            store: Arc::new(ActionStore::new()),
            overrides: Arc::new(OverrideStore::new()),
            values: None,
            remote: None,
            methods: MethodRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    /// Set the compiled program store
    pub fn store(mut self, store: ActionStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Share an already wrapped program store
    pub fn shared_store(mut self, store: Arc<ActionStore>) -> Self {
        self.store = store;
        self
    }

    /// Set the override registry
    pub fn overrides(mut self, overrides: OverrideStore) -> Self {
        self.overrides = Arc::new(overrides);
        self
    }

    /// Set the value store used by data and variable operations
    pub fn values(mut self, values: Arc<dyn ValueStore>) -> Self {
        self.values = Some(values);
        self
    }

    /// Set the contract used for `async` blocks
    pub fn async_dispatch(mut self, remote: Arc<dyn AsyncDispatch>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Register a synchronous host method
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(JsonValue, &MethodContext<'_>) -> anyhow::Result<JsonValue> + Send + Sync + 'static,
    {
        self.methods.register(name, method);
        self
    }

    /// Replace the whole method registry
    pub fn methods(mut self, methods: MethodRegistry) -> Self {
        self.methods = methods;
        self
    }

    /// Set engine limits and error policy
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the dispatcher, defaulting to an in-memory value store
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            store: self.store,
            overrides: self.overrides,
            values: self
                .values
                .unwrap_or_else(|| Arc::new(MemoryValueStore::new())),
            remote: self.remote,
            methods: self.methods,
            config: self.config,
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
