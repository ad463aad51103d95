//! Block processor
//!
//! Runs the block references of one sequence in order (or in the order a
//! block-level branch dictates), feeding each block the results of the
//! blocks before it. The last recorded result is the sequence's result.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::control::Cursor;
use super::errors::ActionError;
use super::host::MethodContext;
use super::hydrate::{hydrate_block, HydratedBlock, ValueScope};
use super::operations::{self, Operation, OperationContext, OperationOutput};
use super::program::RunEnv;
use crate::types::BlockReference;

/// How a sequence finished
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOutcome {
    /// Last recorded block result, `None` for an empty sequence
    pub result: Option<JsonValue>,
    /// Program-level continuation requested by a terminal condition block
    pub branch: Option<Vec<usize>>,
}

/// Run-state for one sequence, owned by a single dispatch
pub struct SequenceRun<'a> {
    index: usize,
    sequence_id: &'a str,
    refs: &'a [BlockReference],
    cursor: Cursor,
    results: Vec<Option<JsonValue>>,
    last: Option<JsonValue>,
    steps: usize,
}

impl<'a> SequenceRun<'a> {
    pub fn new(index: usize, sequence_id: &'a str, refs: &'a [BlockReference]) -> Self {
        Self {
            index,
            sequence_id,
            refs,
            cursor: Cursor::new(refs.len()),
            results: vec![None; refs.len()],
            last: None,
            steps: 0,
        }
    }

    /// Drive the sequence until it runs out of work or a block fails
    pub async fn run(
        mut self,
        env: &RunEnv<'_>,
        sequences: &BTreeMap<usize, JsonValue>,
    ) -> Result<SequenceOutcome, ActionError> {
        let max_steps = env.dispatcher.config().max_steps;
        let terminal = self.refs.len().checked_sub(1);

        while let Some(position) = self.cursor.advance() {
            self.steps += 1;
            if self.steps > max_steps {
                return Err(ActionError::StepLimitExceeded { limit: max_steps });
            }

            let reference = &self.refs[position];
            let block = env.dispatcher.store().block(&reference.block_id).ok_or_else(|| {
                ActionError::BlockNotFound {
                    block_id: reference.block_id.clone(),
                }
            })?;

            let scope = ValueScope {
                context: &env.context_value,
                payload: env.payload,
                blocks: &self.results,
                sequences,
            };
            let hydrated = hydrate_block(block, self.refs, position, &env.overrides, &scope)?;

            tracing::trace!(
                sequence_index = self.index,
                position,
                block_id = hydrated.id(),
                operation = hydrated.operation(),
                "Running block"
            );

            let output = invoke(&hydrated, scope, env).await?;

            match output {
                OperationOutput::Value(value) => self.record(position, value),
                OperationOutput::Branch { result, targets } => {
                    self.record(position, JsonValue::Bool(result));
                    if Some(position) == terminal {
                        tracing::debug!(
                            sequence_id = self.sequence_id,
                            ?targets,
                            "Sequence-level branch"
                        );
                        return Ok(SequenceOutcome {
                            result: self.last,
                            branch: Some(targets),
                        });
                    }
                    tracing::debug!(sequence_id = self.sequence_id, ?targets, "Block-level branch");
                    self.cursor.redirect(targets)?;
                }
            }
        }

        Ok(SequenceOutcome {
            result: self.last,
            branch: None,
        })
    }

    fn record(&mut self, position: usize, value: JsonValue) {
        self.results[position] = Some(value.clone());
        self.last = Some(value);
    }
}

/// Resolve and call a block's operation
///
/// Lookup order: builtin registry, async dispatch (for `async` blocks),
/// registered methods.
async fn invoke(
    hydrated: &HydratedBlock,
    scope: ValueScope<'_>,
    env: &RunEnv<'_>,
) -> Result<OperationOutput, ActionError> {
    let name = hydrated.operation();

    if let Some(op) = Operation::from_name(name) {
        let ctx = OperationContext {
            scope,
            request: env.context,
            values: env.dispatcher.values(),
            dispatcher: env.dispatcher,
            depth: env.depth,
        };
        return operations::execute(op, &hydrated.parameters, &ctx)
            .await
            .map_err(|err| err.into_action_error(name, hydrated.id()));
    }

    if hydrated.is_async() {
        if let Some(remote) = env.dispatcher.async_dispatch() {
            let parameters = JsonValue::clone(&hydrated.parameters);
            return match remote.invoke(name, parameters).await {
                Ok(value) => Ok(OperationOutput::Value(value)),
                Err(error) => Err(ActionError::runtime(name, hydrated.id(), error_message(&error))),
            };
        }
    } else if let Some(method) = env.dispatcher.methods().get(name) {
        let ctx = MethodContext {
            context: scope.context,
            payload: scope.payload,
        };
        let parameters = JsonValue::clone(&hydrated.parameters);
        return match catch_unwind(AssertUnwindSafe(|| method(parameters, &ctx))) {
            Ok(Ok(value)) => Ok(OperationOutput::Value(value)),
            Ok(Err(err)) => Err(ActionError::runtime(name, hydrated.id(), format!("{:#}", err))),
            Err(_) => Err(ActionError::runtime(name, hydrated.id(), "method panicked")),
        };
    }

    Err(ActionError::ActionOperationNotFound {
        operation: name.to_string(),
        block_id: hydrated.id().to_string(),
    })
}

fn error_message(error: &JsonValue) -> String {
    match error {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
