//! Collaborators supplied by the host application
//!
//! - `AsyncDispatch`: runs blocks marked `async` (e.g. a network fetch owned
//!   by another plugin). `Ok` is the success callback, `Err` the error callback.
//! - `MethodRegistry`: synchronous methods other plugins expose to actions.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Asynchronous operation contract
#[async_trait]
pub trait AsyncDispatch: Send + Sync {
    async fn invoke(&self, operation: &str, parameters: JsonValue) -> Result<JsonValue, JsonValue>;
}

/// What a registered method can see besides its parameters
#[derive(Debug, Clone, Copy)]
pub struct MethodContext<'a> {
    pub context: &'a JsonValue,
    pub payload: &'a JsonValue,
}

pub type MethodFn =
    Arc<dyn Fn(JsonValue, &MethodContext<'_>) -> anyhow::Result<JsonValue> + Send + Sync>;

/// Named synchronous methods, resolved after the builtin operations
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodFn>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, method: F)
    where
        F: Fn(JsonValue, &MethodContext<'_>) -> anyhow::Result<JsonValue> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
    }

    pub fn get(&self, name: &str) -> Option<&MethodFn> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.methods.keys().collect();
        names.sort();
        f.debug_struct("MethodRegistry").field("methods", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_call() {
        let mut methods = MethodRegistry::new();
        methods.register("text/upper", |params, _ctx| {
            let s = params.as_str().unwrap_or_default();
            Ok(json!(s.to_uppercase()))
        });

        assert!(methods.contains("text/upper"));
        let method = methods.get("text/upper").unwrap();
        let ctx = MethodContext {
            context: &JsonValue::Null,
            payload: &JsonValue::Null,
        };
        assert_eq!(method(json!("abc"), &ctx).unwrap(), json!("ABC"));
        assert!(methods.get("text/lower").is_none());
    }
}
