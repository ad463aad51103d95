//! Sequence processor
//!
//! Runs every sequence of one action strictly one after another. A sequence
//! only starts once the previous one has fully drained, including any async
//! block it was waiting on.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

use super::control::Cursor;
use super::dispatcher::Dispatcher;
use super::errors::ActionError;
use super::sequence::SequenceRun;
use crate::config::SequenceErrorPolicy;
use crate::types::{DispatchContext, Override};

/// Aggregate result of one dispatch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchOutcome {
    /// Final result of each sequence that produced one, by program position
    pub results: BTreeMap<usize, JsonValue>,
    /// First contained failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl DispatchOutcome {
    pub fn result(&self, index: usize) -> Option<&JsonValue> {
        self.results.get(&index)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Results as a JSON object keyed by sequence index
    pub fn results_json(&self) -> JsonValue {
        let map: Map<String, JsonValue> = self
            .results
            .iter()
            .map(|(idx, v)| (idx.to_string(), v.clone()))
            .collect();
        JsonValue::Object(map)
    }
}

/// Per-dispatch environment shared by every sequence of one run
pub struct RunEnv<'a> {
    pub dispatcher: &'a Dispatcher,
    pub action_id: &'a str,
    pub context: &'a DispatchContext,
    /// Context as JSON with the grouping id injected as `id`
    pub context_value: JsonValue,
    pub payload: &'a JsonValue,
    pub overrides: Arc<Vec<Override>>,
    pub depth: usize,
}

/// Run all sequences of `program`
pub async fn run_program(env: &RunEnv<'_>, program: &[String]) -> DispatchOutcome {
    let config = env.dispatcher.config();
    let mut cursor = Cursor::new(program.len());
    let mut outcome = DispatchOutcome::default();
    let mut steps = 0;

    while let Some(index) = cursor.advance() {
        steps += 1;
        if steps > config.max_steps {
            let err = ActionError::StepLimitExceeded {
                limit: config.max_steps,
            };
            tracing::error!(action_id = env.action_id, error = %err, "Action halted");
            outcome.error.get_or_insert(err);
            break;
        }

        let sequence_id = program[index].as_str();
        let result = run_sequence(env, index, sequence_id, &outcome.results)
            .instrument(tracing::debug_span!("sequence", index, sequence_id))
            .await;

        let failure = match result {
            Ok(sequence) => {
                if let Some(value) = sequence.result {
                    outcome.results.insert(index, value);
                }
                match sequence.branch {
                    Some(targets) => cursor.redirect(targets).err(),
                    None => None,
                }
            }
            Err(err) => Some(err),
        };

        if let Some(err) = failure {
            tracing::error!(
                action_id = env.action_id,
                sequence_id,
                code = err.code(),
                error = %err,
                "Sequence failed"
            );
            outcome.error.get_or_insert(err);

            if config.on_sequence_error == SequenceErrorPolicy::Halt {
                break;
            }
        }
    }

    outcome
}

async fn run_sequence(
    env: &RunEnv<'_>,
    index: usize,
    sequence_id: &str,
    results: &BTreeMap<usize, JsonValue>,
) -> Result<super::sequence::SequenceOutcome, ActionError> {
    let sequence = env.dispatcher.store().sequence(sequence_id).ok_or_else(|| {
        ActionError::SequenceNotFound {
            sequence_id: sequence_id.to_string(),
        }
    })?;

    SequenceRun::new(index, sequence_id, &sequence)
        .run(env, results)
        .await
}
