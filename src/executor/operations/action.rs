//! `action/*` operations: reading dispatch values and nested dispatch

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{parse_params, Operation, OperationContext};
use crate::executor::errors::OperationError;
use crate::executor::resolve::resolve;

#[derive(Debug, Deserialize)]
struct IndexQuery {
    index: usize,
    #[serde(default)]
    query: JsonValue,
}

#[derive(Debug, Deserialize)]
struct ValueQuery {
    #[serde(default)]
    value: JsonValue,
    #[serde(default)]
    query: JsonValue,
}

#[derive(Debug, Deserialize)]
struct DispatchParams {
    id: String,
    #[serde(default)]
    payload: Option<JsonValue>,
}

/// Result of an earlier block in the same sequence
pub fn get_block_value(
    params: &JsonValue,
    ctx: &OperationContext<'_>,
) -> Result<JsonValue, OperationError> {
    let p: IndexQuery = parse_params(Operation::ActionGetBlockValue, params)?;
    match ctx.scope.block(p.index) {
        Some(v) => Ok(resolve(v, &p.query)),
        None => {
            tracing::warn!(index = p.index, "Block value requested before it was produced");
            Ok(JsonValue::Null)
        }
    }
}

/// Result of an earlier sequence in the same program
pub fn get_sequence_value(
    params: &JsonValue,
    ctx: &OperationContext<'_>,
) -> Result<JsonValue, OperationError> {
    let p: IndexQuery = parse_params(Operation::ActionGetSequenceValue, params)?;
    match ctx.scope.sequence(p.index) {
        Some(v) => Ok(resolve(v, &p.query)),
        None => {
            tracing::warn!(index = p.index, "Sequence value requested before it was produced");
            Ok(JsonValue::Null)
        }
    }
}

/// The parameters are the query itself
pub fn get_context_value(params: &JsonValue, ctx: &OperationContext<'_>) -> JsonValue {
    resolve(ctx.scope.context, params)
}

pub fn get_payload_value(params: &JsonValue, ctx: &OperationContext<'_>) -> JsonValue {
    resolve(ctx.scope.payload, params)
}

/// Query an arbitrary value, usually one spliced in from a child block
pub fn get_value(params: &JsonValue) -> Result<JsonValue, OperationError> {
    let p: ValueQuery = parse_params(Operation::ActionGetValue, params)?;
    Ok(resolve(&p.value, &p.query))
}

/// Run another action with the same context, waiting for it to drain
///
/// The nested results come back keyed by sequence index. A failure inside
/// the nested action fails this block.
pub async fn dispatch(
    params: &JsonValue,
    ctx: &OperationContext<'_>,
) -> Result<JsonValue, OperationError> {
    let p: DispatchParams = parse_params(Operation::ActionDispatch, params)?;
    let payload = p.payload.unwrap_or_else(|| ctx.scope.payload.clone());

    let outcome = ctx
        .dispatcher
        .run_action(&p.id, ctx.request, &payload, ctx.depth + 1)
        .await?;

    if let Some(err) = outcome.error {
        return Err(err.into());
    }

    let results: Map<String, JsonValue> = outcome
        .results
        .into_iter()
        .map(|(idx, v)| (idx.to_string(), v))
        .collect();
    Ok(JsonValue::Object(results))
}
