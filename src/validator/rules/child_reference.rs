//! Rule: Child Reference
//!
//! A child must sit at an earlier position of the same sequence and its path
//! must extend the parent's path, otherwise there is nowhere to splice the
//! child's result.

use crate::types::ProgramFile;

use super::super::{sorted_keys, Location, ValidationError, ValidationRule};

pub struct ChildReferenceRule;

impl ValidationRule for ChildReferenceRule {
    fn id(&self) -> &'static str {
        "child-reference"
    }

    fn description(&self) -> &'static str {
        "Children must precede their parent and extend its path"
    }

    fn validate(&self, file: &ProgramFile) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for sequence_id in sorted_keys(&file.sequences) {
            let refs = &file.sequences[sequence_id];
            for (position, reference) in refs.iter().enumerate() {
                for &child in &reference.children {
                    let location = Location::reference(sequence_id, position, &reference.block_id);

                    if child >= position {
                        errors.push(ValidationError::error(
                            location,
                            format!("child {} does not precede its parent", child),
                            self.id(),
                        ));
                        continue;
                    }

                    let child_path = &refs[child].path;
                    if child_path.len() <= reference.path.len()
                        || !child_path.starts_with(&reference.path)
                    {
                        errors.push(ValidationError::error(
                            location,
                            format!("path of child {} does not extend the parent path", child),
                            self.id(),
                        ));
                    }
                }
            }
        }

        errors
    }
}
