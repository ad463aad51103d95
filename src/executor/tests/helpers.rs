//! Test helpers for executor tests
//!
//! Builds dispatchers from JSON program files and provides host doubles
//! that record what ran.

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::executor::{AsyncDispatch, Dispatcher, DispatcherBuilder};
use crate::store::ActionStore;
use crate::types::{DispatchContext, DispatchRequest};

/// Shared, ordered log of what the host saw
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Async double: `remote/ok` echoes its parameters, `remote/fail` errors
pub struct ScriptedRemote {
    log: CallLog,
    delay: Duration,
}

impl ScriptedRemote {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            delay: Duration::from_millis(10),
        }
    }
}

#[async_trait]
impl AsyncDispatch for ScriptedRemote {
    async fn invoke(&self, operation: &str, parameters: JsonValue) -> Result<JsonValue, JsonValue> {
        self.log.push(format!("{}:start", operation));
        tokio::time::sleep(self.delay).await;
        self.log.push(format!("{}:end", operation));

        match operation {
            "remote/ok" => Ok(json!({ "echo": parameters })),
            _ => Err(json!("boom")),
        }
    }
}

/// Builder with the store from `file`, a `test/record` method that logs its
/// `tag` parameter, and a `test/echo` method that returns its parameters
pub fn builder(file: JsonValue, log: &CallLog) -> DispatcherBuilder {
    let (store, overrides) =
        ActionStore::from_json(&file.to_string()).expect("Program file should load");

    let record_log = log.clone();
    DispatcherBuilder::new()
        .store(store)
        .overrides(overrides)
        .method("test/record", move |params, _ctx| {
            let tag = params["tag"].as_str().unwrap_or("?").to_string();
            record_log.push(tag);
            Ok(params)
        })
        .method("test/echo", |params, _ctx| Ok(params))
}

/// Dispatcher over `file` with default config
pub fn dispatcher(file: JsonValue) -> (Dispatcher, CallLog) {
    let log = CallLog::default();
    let dispatcher = builder(file, &log).build();
    (dispatcher, log)
}

/// Dispatcher over `file` with custom engine config
pub fn dispatcher_with_config(file: JsonValue, config: EngineConfig) -> (Dispatcher, CallLog) {
    let log = CallLog::default();
    let dispatcher = builder(file, &log).config(config).build();
    (dispatcher, log)
}

/// Dispatcher whose `async` blocks go to a `ScriptedRemote` sharing the log
pub fn async_dispatcher(file: JsonValue, config: EngineConfig) -> (Dispatcher, CallLog) {
    let log = CallLog::default();
    let dispatcher = builder(file, &log)
        .async_dispatch(Arc::new(ScriptedRemote::new(log.clone())))
        .config(config)
        .build();
    (dispatcher, log)
}

pub fn request(widget_id: &str, payload: JsonValue) -> DispatchRequest {
    DispatchRequest::new(DispatchContext::widget(widget_id), payload)
}

/// A `test/record` block
pub fn record(tag: &str) -> JsonValue {
    json!({ "operation": "test/record", "parameters": { "tag": tag } })
}
