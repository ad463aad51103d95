//! `operator/*` operations

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{parse_params, Operation};
use crate::executor::errors::OperationError;
use crate::executor::operators;

#[derive(Debug, Deserialize)]
struct EvalParams {
    name: String,
    #[serde(default)]
    values: Vec<JsonValue>,
}

/// `{ name: "+", values: [1, 2] }`
pub fn eval(params: &JsonValue) -> Result<JsonValue, OperationError> {
    let p: EvalParams = parse_params(Operation::OperatorEval, params)?;
    operators::eval(&p.name, &p.values).map_err(OperationError::invalid)
}

/// `[a, "&&", b, "||", c]`
pub fn compare(params: &JsonValue) -> Result<JsonValue, OperationError> {
    let items: Vec<JsonValue> = parse_params(Operation::OperatorCompare, params)?;
    operators::compare(&items)
        .map(JsonValue::Bool)
        .map_err(OperationError::invalid)
}
