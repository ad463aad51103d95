//! Rule: Branch Target
//!
//! Checks literal `then`/`else` targets of `action/ifElse` blocks. A condition
//! in the middle of a sequence jumps within that sequence; the last block of a
//! sequence jumps within every program that runs the sequence.

use serde_json::Value as JsonValue;

use crate::executor::Operation;
use crate::types::ProgramFile;

use super::super::{sorted_keys, Location, ValidationError, ValidationRule};

pub struct BranchTargetRule;

impl ValidationRule for BranchTargetRule {
    fn id(&self) -> &'static str {
        "branch-target"
    }

    fn description(&self) -> &'static str {
        "Condition targets must be valid positions"
    }

    fn validate(&self, file: &ProgramFile) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for sequence_id in sorted_keys(&file.sequences) {
            let refs = &file.sequences[sequence_id];
            for (position, reference) in refs.iter().enumerate() {
                let Some(block) = file.blocks.get(&reference.block_id) else {
                    continue;
                };
                if block.operation != Operation::ActionIfElse.name() {
                    continue;
                }

                let targets = literal_targets(&block.parameters);
                let location = || Location::reference(sequence_id, position, &reference.block_id);

                if position + 1 < refs.len() {
                    for target in targets.iter().filter(|&&t| t >= refs.len()) {
                        errors.push(ValidationError::error(
                            location(),
                            format!(
                                "target {} is outside the sequence ({} blocks)",
                                target,
                                refs.len()
                            ),
                            self.id(),
                        ));
                    }
                    continue;
                }

                for action_id in sorted_keys(&file.actions) {
                    let program = &file.actions[action_id];
                    if !program.iter().any(|s| s == sequence_id) {
                        continue;
                    }
                    for target in targets.iter().filter(|&&t| t >= program.len()) {
                        let mut loc = location();
                        loc.action_id = Some(action_id.clone());
                        errors.push(ValidationError::error(
                            loc,
                            format!(
                                "target {} is outside the program ({} sequences)",
                                target,
                                program.len()
                            ),
                            self.id(),
                        ));
                    }
                }
            }
        }

        errors
    }
}

/// Targets written as plain numbers; placeholders are only known at run time
fn literal_targets(parameters: &JsonValue) -> Vec<usize> {
    ["then", "else"]
        .iter()
        .filter_map(|key| parameters.get(key))
        .filter_map(JsonValue::as_array)
        .flatten()
        .filter_map(JsonValue::as_u64)
        .map(|t| t as usize)
        .collect()
}
