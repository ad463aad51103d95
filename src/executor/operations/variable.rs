//! `variable/*` operations
//!
//! Variables are grouped in one value-store document per scope. The scope
//! defaults to the dispatch's grouping id (`context.id`), so widgets sharing
//! a group share variables.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use super::{parse_params, Operation, OperationContext};
use crate::executor::errors::OperationError;
use crate::store::{compose_id, GetOptions, SetOptions};

pub const COLLECTION: &str = "variable/values";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetParams {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    prefix_id: Option<String>,
    #[serde(default)]
    suffix_id: Option<String>,
    query: VariableQuery,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VariableQuery {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetParams {
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    prefix_id: Option<String>,
    #[serde(default)]
    suffix_id: Option<String>,
    values: Vec<VariableValue>,
}

#[derive(Debug, Deserialize)]
struct VariableValue {
    #[serde(default)]
    id: Option<String>,
    value: JsonValue,
}

fn scope_id(explicit: Option<String>, ctx: &OperationContext<'_>) -> Result<String, OperationError> {
    explicit
        .or_else(|| ctx.scope.context.get("id").and_then(|v| v.as_str()).map(String::from))
        .ok_or_else(|| OperationError::invalid("variable scope missing: no scope given and context has no id"))
}

pub fn get_value(params: &JsonValue, ctx: &OperationContext<'_>) -> Result<JsonValue, OperationError> {
    let p: GetParams = parse_params(Operation::VariableGetValue, params)?;
    let scope = scope_id(p.scope, ctx)?;

    let document = ctx
        .values
        .get(
            COLLECTION,
            &GetOptions {
                id: Some(scope),
                ..GetOptions::default()
            },
        )
        .item;

    let lookup = |name: &str| {
        let key = compose_id(p.prefix_id.as_deref(), name, p.suffix_id.as_deref());
        document.get(&key).cloned().unwrap_or(JsonValue::Null)
    };

    let value = match &p.query {
        VariableQuery::One(name) => lookup(name),
        VariableQuery::Many(names) => {
            let values: Map<String, JsonValue> =
                names.iter().map(|n| (n.clone(), lookup(n))).collect();
            JsonValue::Object(values)
        }
    };

    Ok(value)
}

/// Returns `{ id: scope, isValid, ids: [variable ids] }`
pub fn set_value(params: &JsonValue, ctx: &OperationContext<'_>) -> Result<JsonValue, OperationError> {
    let p: SetParams = parse_params(Operation::VariableSetValue, params)?;
    let scope = scope_id(p.scope, ctx)?;

    let mut ids = Vec::with_capacity(p.values.len());
    let mut patch = Map::new();
    for entry in p.values {
        let base = entry.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let id = compose_id(p.prefix_id.as_deref(), &base, p.suffix_id.as_deref());
        patch.insert(id.clone(), entry.value);
        ids.push(JsonValue::String(id));
    }

    let result = ctx.values.set(
        COLLECTION,
        JsonValue::Object(patch),
        &SetOptions {
            id: Some(scope),
            merge: true,
            ..SetOptions::default()
        },
    );

    let mut out = Map::new();
    out.insert("id".to_string(), JsonValue::String(result.id));
    out.insert("isValid".to_string(), JsonValue::Bool(result.is_valid));
    out.insert("ids".to_string(), JsonValue::Array(ids));
    if let Some(error) = result.error {
        out.insert("error".to_string(), JsonValue::String(error));
    }
    Ok(JsonValue::Object(out))
}
