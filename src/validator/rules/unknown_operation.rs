//! Rule: Unknown Operation
//!
//! Warns about blocks whose operation is not builtin and not marked `async`.
//! Such a block only runs if the host registers a method of that name.

use crate::executor::Operation;
use crate::types::ProgramFile;

use super::super::{sorted_keys, Location, ValidationError, ValidationRule};

pub struct UnknownOperationRule;

impl ValidationRule for UnknownOperationRule {
    fn id(&self) -> &'static str {
        "unknown-operation"
    }

    fn description(&self) -> &'static str {
        "Operations should be builtin, async, or a registered method"
    }

    fn validate(&self, file: &ProgramFile) -> Vec<ValidationError> {
        sorted_keys(&file.blocks)
            .into_iter()
            .filter_map(|block_id| {
                let block = &file.blocks[block_id];
                if block.is_async || Operation::from_name(&block.operation).is_some() {
                    return None;
                }
                Some(ValidationError::warning(
                    Location::block(block_id),
                    format!(
                        "operation '{}' is not builtin; it must be registered as a method",
                        block.operation
                    ),
                    self.id(),
                ))
            })
            .collect()
    }
}
