//! Compiled action program data model
//!
//! These are the persisted shapes the engine consumes: blocks keyed by id,
//! sequences as ordered block references, and actions (programs) as ordered
//! sequence ids.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/* ===================== Paths ===================== */

/// Path segment type - either an integer index or a string key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(idx) => write!(f, "{}", idx),
            PathSegment::Key(key) => write!(f, "{}", key),
        }
    }
}

/// Position of a block reference within the program's value tree
pub type ValuePath = Vec<PathSegment>;

/* ===================== Program Shapes ===================== */

/// A single compiled operation instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Filled from the map key when loaded through `ActionStore`
    #[serde(default)]
    pub id: String,

    /// Operation name, e.g. `operator/eval`
    pub operation: String,

    /// Static parameter tree, shared between dispatches
    #[serde(default)]
    pub parameters: Arc<JsonValue>,

    /// Invoke through the async dispatch contract instead of returning synchronously
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

impl Block {
    pub fn new(operation: impl Into<String>, parameters: JsonValue) -> Self {
        Self {
            id: String::new(),
            operation: operation.into(),
            parameters: Arc::new(parameters),
            is_async: false,
        }
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }
}

/// An entry inside a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReference {
    pub block_id: String,

    #[serde(default)]
    pub path: ValuePath,

    /// Earlier positions in the same sequence whose results are spliced in
    #[serde(default)]
    pub children: Vec<usize>,
}

impl BlockReference {
    pub fn new(block_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            path: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn at(mut self, path: ValuePath) -> Self {
        self.path = path;
        self
    }

    pub fn with_children(mut self, children: Vec<usize>) -> Self {
        self.children = children;
        self
    }
}

/// Ordered block references forming one branch of program logic
pub type Sequence = Vec<BlockReference>;

/// Ordered sequence ids dispatched together (an "action item")
pub type Program = Vec<String>;

/* ===================== Overrides ===================== */

/// One `{ keys, value }` patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideValue {
    pub keys: ValuePath,
    pub value: JsonValue,
}

/// Caller supplied patches for one block, applied to a private copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    /// Id of the block being patched
    pub id: String,
    pub values: Vec<OverrideValue>,
}

/// Overrides registered for one (group, action) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSet {
    pub group_id: String,
    pub action_id: String,
    pub overrides: Vec<Override>,
}

/// Everything a compiled program file contains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramFile {
    #[serde(default)]
    pub blocks: HashMap<String, Block>,

    #[serde(default)]
    pub sequences: HashMap<String, Sequence>,

    #[serde(default)]
    pub actions: HashMap<String, Program>,

    #[serde(default)]
    pub overrides: Vec<OverrideSet>,
}

/* ===================== Dispatch Input ===================== */

/// Caller-identifying data threaded through value resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,

    /// Any other caller fields, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl DispatchContext {
    pub fn widget(widget_id: impl Into<String>) -> Self {
        Self {
            widget_id: Some(widget_id.into()),
            ..Self::default()
        }
    }

    pub fn group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Id used for variable scoping: widget, then section, view, content
    pub fn grouping_id(&self) -> Option<&str> {
        self.widget_id
            .as_deref()
            .or(self.section_id.as_deref())
            .or(self.view_id.as_deref())
            .or(self.content_id.as_deref())
    }

    /// Key under which override sets are registered
    pub fn override_group(&self) -> Option<&str> {
        self.group_id.as_deref().or(self.widget_id.as_deref())
    }

    /// JSON view of the context with the grouping id injected as `id`
    pub fn to_value(&self) -> JsonValue {
        let mut obj = self.extra.clone();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                obj.insert(key.to_string(), JsonValue::String(v.clone()));
            }
        };
        put("widgetId", &self.widget_id);
        put("groupId", &self.group_id);
        put("sectionId", &self.section_id);
        put("viewId", &self.view_id);
        put("contentId", &self.content_id);

        if let Some(id) = self.grouping_id() {
            obj.insert("id".to_string(), JsonValue::String(id.to_string()));
        }

        JsonValue::Object(obj)
    }
}

/// Public dispatch input: who invoked and the event data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    #[serde(default)]
    pub context: DispatchContext,

    #[serde(default)]
    pub payload: JsonValue,
}

impl DispatchRequest {
    pub fn new(context: DispatchContext, payload: JsonValue) -> Self {
        Self { context, payload }
    }
}
