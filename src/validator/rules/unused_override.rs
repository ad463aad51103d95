//! Rule: Unused Override
//!
//! Warns about override sets that can never apply: the action doesn't exist,
//! or the patched block isn't used by any sequence of that action.

use std::collections::HashSet;

use crate::types::ProgramFile;

use super::super::{Location, ValidationError, ValidationRule};

pub struct UnusedOverrideRule;

impl ValidationRule for UnusedOverrideRule {
    fn id(&self) -> &'static str {
        "unused-override"
    }

    fn description(&self) -> &'static str {
        "Overrides should target blocks of an existing action"
    }

    fn validate(&self, file: &ProgramFile) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for set in &file.overrides {
            let Some(program) = file.actions.get(&set.action_id) else {
                errors.push(ValidationError::warning(
                    Location::action(&set.action_id),
                    format!(
                        "overrides for group '{}' target an undefined action",
                        set.group_id
                    ),
                    self.id(),
                ));
                continue;
            };

            let used: HashSet<&str> = program
                .iter()
                .filter_map(|sequence_id| file.sequences.get(sequence_id))
                .flatten()
                .map(|reference| reference.block_id.as_str())
                .collect();

            for patch in set.overrides.iter().filter(|o| !used.contains(o.id.as_str())) {
                let mut location = Location::action(&set.action_id);
                location.block_id = Some(patch.id.clone());
                errors.push(ValidationError::warning(
                    location,
                    format!(
                        "override for group '{}' patches a block the action never runs",
                        set.group_id
                    ),
                    self.id(),
                ));
            }
        }

        errors
    }
}
