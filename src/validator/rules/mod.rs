//! Validation Rules
//!
//! Each file in this module contains one validation rule:
//!
//! - `missing_reference.rs` - Actions and sequences pointing at ids that don't exist
//! - `child_reference.rs` - Child positions that can't be spliced into their parent
//! - `branch_target.rs` - Literal condition targets outside the sequence or program
//! - `unknown_operation.rs` - Operations that are neither builtin nor async
//! - `unused_override.rs` - Override sets for unknown actions or blocks

mod branch_target;
mod child_reference;
mod missing_reference;
mod unknown_operation;
mod unused_override;

pub use branch_target::BranchTargetRule;
pub use child_reference::ChildReferenceRule;
pub use missing_reference::MissingReferenceRule;
pub use unknown_operation::UnknownOperationRule;
pub use unused_override::UnusedOverrideRule;
