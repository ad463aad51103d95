//! Block hydration
//!
//! Turns a shared `Block` plus one `BlockReference` into the concrete
//! parameters for this dispatch. The shared parameter tree is only copied
//! (through `Arc::make_mut`) when an override, a child splice or a
//! placeholder actually has to write into it.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::errors::ActionError;
use super::resolve::resolve;
use crate::types::{Block, BlockReference, Override, PathSegment};

/* ===================== Scope ===================== */

/// Values a block can read while it is being hydrated or executed
#[derive(Debug, Clone, Copy)]
pub struct ValueScope<'a> {
    pub context: &'a JsonValue,
    pub payload: &'a JsonValue,
    /// Results of earlier blocks in the current sequence, by position
    pub blocks: &'a [Option<JsonValue>],
    /// Results of earlier sequences in the program, by position
    pub sequences: &'a BTreeMap<usize, JsonValue>,
}

impl<'a> ValueScope<'a> {
    pub fn block(&self, index: usize) -> Option<&'a JsonValue> {
        self.blocks.get(index).and_then(Option::as_ref)
    }

    pub fn sequence(&self, index: usize) -> Option<&'a JsonValue> {
        self.sequences.get(&index)
    }
}

/* ===================== Hydrated Block ===================== */

/// A block ready to run
#[derive(Debug, Clone)]
pub struct HydratedBlock {
    pub block: Arc<Block>,
    pub parameters: Arc<JsonValue>,
}

impl HydratedBlock {
    pub fn id(&self) -> &str {
        &self.block.id
    }

    pub fn operation(&self) -> &str {
        &self.block.operation
    }

    pub fn is_async(&self) -> bool {
        self.block.is_async
    }

    /// True while the parameters still point at the shared template
    pub fn is_shared(&self) -> bool {
        Arc::ptr_eq(&self.parameters, &self.block.parameters)
    }
}

/// Hydrate the block at `position` of `refs`
///
/// Order: overrides, then placeholders, then child results. Child results
/// win over anything compiled or patched into the same slot and are written
/// verbatim, so a `$from` object inside a child result stays data.
pub fn hydrate_block(
    block: Arc<Block>,
    refs: &[BlockReference],
    position: usize,
    overrides: &[Override],
    scope: &ValueScope<'_>,
) -> Result<HydratedBlock, ActionError> {
    let reference = &refs[position];
    let mut parameters = Arc::clone(&block.parameters);

    for patch in overrides.iter().filter(|o| o.id == block.id) {
        for value in &patch.values {
            set_at(Arc::make_mut(&mut parameters), &value.keys, value.value.clone()).map_err(
                |reason| {
                    ActionError::runtime(
                        &block.operation,
                        &block.id,
                        format!("override {:?}: {}", value.keys, reason),
                    )
                },
            )?;
        }
    }

    if has_placeholders(&parameters) {
        resolve_placeholders(Arc::make_mut(&mut parameters), scope);
    }

    for &child in &reference.children {
        splice_child(&mut parameters, refs, position, child, scope)?;
    }

    Ok(HydratedBlock { block, parameters })
}

/// Write the result of `child` into the parent's parameters at the child's path
fn splice_child(
    parameters: &mut Arc<JsonValue>,
    refs: &[BlockReference],
    position: usize,
    child: usize,
    scope: &ValueScope<'_>,
) -> Result<(), ActionError> {
    let invalid = |reason: &str| ActionError::InvalidChildReference {
        position,
        child,
        reason: reason.to_string(),
    };

    if child >= position {
        return Err(invalid("child must precede its parent"));
    }
    let value = scope
        .block(child)
        .ok_or_else(|| invalid("child has no result"))?;

    let parent_path = &refs[position].path;
    let child_path = &refs[child].path;
    if child_path.len() <= parent_path.len() || !child_path.starts_with(parent_path) {
        return Err(invalid("child path does not extend the parent path"));
    }

    set_at(
        Arc::make_mut(parameters),
        &child_path[parent_path.len()..],
        value.clone(),
    )
    .map_err(|reason| invalid(&reason))
}

/// Assign `value` at `keys`, creating missing intermediate objects
pub fn set_at(root: &mut JsonValue, keys: &[PathSegment], value: JsonValue) -> Result<(), String> {
    let Some((last, parents)) = keys.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for segment in parents {
        current = step_into(current, segment)?;
    }

    match (current, last) {
        (JsonValue::Array(arr), PathSegment::Index(idx)) => {
            if *idx < arr.len() {
                arr[*idx] = value;
            } else if *idx == arr.len() {
                arr.push(value);
            } else {
                return Err(format!("index {} out of bounds", idx));
            }
        }
        (node, PathSegment::Key(key)) => {
            if node.is_null() {
                *node = JsonValue::Object(Map::new());
            }
            match node {
                JsonValue::Object(obj) => {
                    obj.insert(key.clone(), value);
                }
                _ => return Err(format!("cannot set key '{}' on a non-object", key)),
            }
        }
        (_, PathSegment::Index(idx)) => {
            return Err(format!("cannot set index {} on a non-array", idx));
        }
    }

    Ok(())
}

fn step_into<'a>(node: &'a mut JsonValue, segment: &PathSegment) -> Result<&'a mut JsonValue, String> {
    match segment {
        PathSegment::Key(key) => {
            if node.is_null() {
                *node = JsonValue::Object(Map::new());
            }
            match node {
                JsonValue::Object(obj) => Ok(obj
                    .entry(key.clone())
                    .or_insert_with(|| JsonValue::Object(Map::new()))),
                _ => Err(format!("cannot walk key '{}' on a non-object", key)),
            }
        }
        PathSegment::Index(idx) => match node {
            JsonValue::Array(arr) => arr
                .get_mut(*idx)
                .ok_or_else(|| format!("index {} out of bounds", idx)),
            _ => Err(format!("cannot walk index {} on a non-array", idx)),
        },
    }
}

/* ===================== Placeholders ===================== */

/// `{"$from": ..., "index"?: n, "query"?: q}`
#[derive(Debug, Deserialize)]
#[serde(tag = "$from", rename_all = "lowercase")]
enum Placeholder {
    Context {
        #[serde(default)]
        query: JsonValue,
    },
    Payload {
        #[serde(default)]
        query: JsonValue,
    },
    Block {
        index: usize,
        #[serde(default)]
        query: JsonValue,
    },
    Sequence {
        index: usize,
        #[serde(default)]
        query: JsonValue,
    },
}

fn is_placeholder(obj: &Map<String, JsonValue>) -> bool {
    obj.get("$from").map(JsonValue::is_string).unwrap_or(false)
}

pub fn has_placeholders(value: &JsonValue) -> bool {
    match value {
        JsonValue::Object(obj) => is_placeholder(obj) || obj.values().any(has_placeholders),
        JsonValue::Array(arr) => arr.iter().any(has_placeholders),
        _ => false,
    }
}

/// Replace every placeholder in `value` with what it points at
pub fn resolve_placeholders(value: &mut JsonValue, scope: &ValueScope<'_>) {
    if let JsonValue::Object(obj) = value {
        if is_placeholder(obj) {
            let placeholder = JsonValue::Object(std::mem::take(obj));
            *value = match serde_json::from_value::<Placeholder>(placeholder.clone()) {
                Ok(p) => resolve_placeholder(p, scope),
                Err(err) => {
                    tracing::warn!(error = %err, "Malformed placeholder left unresolved");
                    placeholder
                }
            };
            return;
        }
    }

    match value {
        JsonValue::Object(obj) => {
            for v in obj.values_mut() {
                resolve_placeholders(v, scope);
            }
        }
        JsonValue::Array(arr) => {
            for v in arr.iter_mut() {
                resolve_placeholders(v, scope);
            }
        }
        _ => {}
    }
}

fn resolve_placeholder(placeholder: Placeholder, scope: &ValueScope<'_>) -> JsonValue {
    match placeholder {
        Placeholder::Context { query } => resolve(scope.context, &query),
        Placeholder::Payload { query } => resolve(scope.payload, &query),
        Placeholder::Block { index, query } => match scope.block(index) {
            Some(v) => resolve(v, &query),
            None => {
                tracing::warn!(index, "Placeholder references a block without a result");
                JsonValue::Null
            }
        },
        Placeholder::Sequence { index, query } => match scope.sequence(index) {
            Some(v) => resolve(v, &query),
            None => {
                tracing::warn!(index, "Placeholder references a sequence without a result");
                JsonValue::Null
            }
        },
    }
}
