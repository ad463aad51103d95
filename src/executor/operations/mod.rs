//! Builtin operation registry
//!
//! Operations are a closed set, resolved from their name once per block.
//! Each family lives in its own module.

pub mod action;
pub mod condition;
pub mod data;
pub mod operator;
pub mod variable;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::dispatcher::Dispatcher;
use super::errors::OperationError;
use super::hydrate::ValueScope;
use crate::store::ValueStore;
use crate::types::DispatchContext;

/* ===================== Operation Identifiers ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ActionDispatch,
    ActionGetBlockValue,
    ActionGetContextValue,
    ActionGetPayloadValue,
    ActionGetSequenceValue,
    ActionGetValue,
    ActionIfElse,
    DataGetValue,
    DataSetValue,
    DataDeleteValue,
    VariableGetValue,
    VariableSetValue,
    OperatorEval,
    OperatorCompare,
}

impl Operation {
    pub const ALL: [Operation; 14] = [
        Operation::ActionDispatch,
        Operation::ActionGetBlockValue,
        Operation::ActionGetContextValue,
        Operation::ActionGetPayloadValue,
        Operation::ActionGetSequenceValue,
        Operation::ActionGetValue,
        Operation::ActionIfElse,
        Operation::DataGetValue,
        Operation::DataSetValue,
        Operation::DataDeleteValue,
        Operation::VariableGetValue,
        Operation::VariableSetValue,
        Operation::OperatorEval,
        Operation::OperatorCompare,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::ActionDispatch => "action/dispatch",
            Operation::ActionGetBlockValue => "action/getBlockValue",
            Operation::ActionGetContextValue => "action/getContextValue",
            Operation::ActionGetPayloadValue => "action/getPayloadValue",
            Operation::ActionGetSequenceValue => "action/getSequenceValue",
            Operation::ActionGetValue => "action/getValue",
            Operation::ActionIfElse => "action/ifElse",
            Operation::DataGetValue => "data/getValue",
            Operation::DataSetValue => "data/setValue",
            Operation::DataDeleteValue => "data/deleteValue",
            Operation::VariableGetValue => "variable/getValue",
            Operation::VariableSetValue => "variable/setValue",
            Operation::OperatorEval => "operator/eval",
            Operation::OperatorCompare => "operator/compare",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

/* ===================== Execution ===================== */

/// Everything a handler may touch
pub struct OperationContext<'a> {
    pub scope: ValueScope<'a>,
    pub request: &'a DispatchContext,
    pub values: &'a dyn ValueStore,
    pub dispatcher: &'a Dispatcher,
    /// Nesting level of the dispatch running this block
    pub depth: usize,
}

/// What a handler hands back to the block processor
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Value(JsonValue),
    /// Conditional result plus the positions to continue at
    Branch { result: bool, targets: Vec<usize> },
}

/// Run a builtin operation
pub async fn execute(
    op: Operation,
    params: &JsonValue,
    ctx: &OperationContext<'_>,
) -> Result<OperationOutput, OperationError> {
    let value = match op {
        Operation::ActionDispatch => action::dispatch(params, ctx).await?,
        Operation::ActionGetBlockValue => action::get_block_value(params, ctx)?,
        Operation::ActionGetContextValue => action::get_context_value(params, ctx),
        Operation::ActionGetPayloadValue => action::get_payload_value(params, ctx),
        Operation::ActionGetSequenceValue => action::get_sequence_value(params, ctx)?,
        Operation::ActionGetValue => action::get_value(params)?,
        Operation::ActionIfElse => return condition::if_else(params),
        Operation::DataGetValue => data::get_value(params, ctx)?,
        Operation::DataSetValue => data::set_value(params, ctx)?,
        Operation::DataDeleteValue => data::delete_value(params, ctx)?,
        Operation::VariableGetValue => variable::get_value(params, ctx)?,
        Operation::VariableSetValue => variable::set_value(params, ctx)?,
        Operation::OperatorEval => operator::eval(params)?,
        Operation::OperatorCompare => operator::compare(params)?,
    };

    Ok(OperationOutput::Value(value))
}

/// Deserialize a handler's parameters straight from the hydrated tree
pub(crate) fn parse_params<'de, T: Deserialize<'de>>(
    op: Operation,
    params: &'de JsonValue,
) -> Result<T, OperationError> {
    T::deserialize(params).map_err(|err| {
        OperationError::invalid(format!("invalid parameters for {}: {}", op.name(), err))
    })
}

pub(crate) fn to_json<T: serde::Serialize>(value: T) -> Result<JsonValue, OperationError> {
    serde_json::to_value(value).map_err(|err| OperationError::invalid(err.to_string()))
}
