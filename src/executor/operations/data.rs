//! `data/*` operations against the value store

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{parse_params, to_json, Operation, OperationContext};
use crate::executor::errors::OperationError;
use crate::store::{DeleteOptions, GetOptions, SetOptions};

#[derive(Debug, Deserialize)]
struct GetParams {
    name: String,
    #[serde(flatten)]
    options: GetOptions,
}

#[derive(Debug, Deserialize)]
struct SetParams {
    name: String,
    value: JsonValue,
    #[serde(default)]
    options: SetOptions,
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    name: String,
    id: String,
    #[serde(flatten)]
    options: DeleteOptions,
}

pub fn get_value(params: &JsonValue, ctx: &OperationContext<'_>) -> Result<JsonValue, OperationError> {
    let p: GetParams = parse_params(Operation::DataGetValue, params)?;
    to_json(ctx.values.get(&p.name, &p.options))
}

pub fn set_value(params: &JsonValue, ctx: &OperationContext<'_>) -> Result<JsonValue, OperationError> {
    let p: SetParams = parse_params(Operation::DataSetValue, params)?;
    let result = ctx.values.set(&p.name, p.value, &p.options);
    if !result.is_valid {
        tracing::warn!(
            collection = %p.name,
            id = %result.id,
            error = result.error.as_deref().unwrap_or(""),
            "Value store rejected write"
        );
    }
    to_json(result)
}

pub fn delete_value(
    params: &JsonValue,
    ctx: &OperationContext<'_>,
) -> Result<JsonValue, OperationError> {
    let p: DeleteParams = parse_params(Operation::DataDeleteValue, params)?;
    to_json(ctx.values.delete(&p.name, &p.id, &p.options))
}
