//! Rule: Missing Reference
//!
//! Reports an error when an action names a sequence, or a sequence names a
//! block, that the file doesn't define.

use crate::types::ProgramFile;

use super::super::{sorted_keys, Location, ValidationError, ValidationRule};

pub struct MissingReferenceRule;

impl ValidationRule for MissingReferenceRule {
    fn id(&self) -> &'static str {
        "missing-reference"
    }

    fn description(&self) -> &'static str {
        "Every referenced sequence and block must be defined"
    }

    fn validate(&self, file: &ProgramFile) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for action_id in sorted_keys(&file.actions) {
            for sequence_id in &file.actions[action_id] {
                if !file.sequences.contains_key(sequence_id) {
                    errors.push(ValidationError::error(
                        Location::action(action_id),
                        format!("sequence '{}' is not defined", sequence_id),
                        self.id(),
                    ));
                }
            }
        }

        for sequence_id in sorted_keys(&file.sequences) {
            for (position, reference) in file.sequences[sequence_id].iter().enumerate() {
                if !file.blocks.contains_key(&reference.block_id) {
                    errors.push(ValidationError::error(
                        Location::reference(sequence_id, position, &reference.block_id),
                        format!("block '{}' is not defined", reference.block_id),
                        self.id(),
                    ));
                }
            }
        }

        errors
    }
}
