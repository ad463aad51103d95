//! Engine error taxonomy
//!
//! Every failure is logged and contained where it happens; these values
//! travel back up inside `DispatchOutcome` rather than as panics.

use serde::Serialize;

/* ===================== Error Codes ===================== */

pub const ACTION_NOT_FOUND: &str = "ACTION_NOT_FOUND";
pub const SEQUENCE_NOT_FOUND: &str = "SEQUENCE_NOT_FOUND";
pub const BLOCK_NOT_FOUND: &str = "BLOCK_NOT_FOUND";
pub const OPERATION_NOT_FOUND: &str = "ACTION_OPERATION_NOT_FOUND";
pub const OPERATION_RUNTIME_ERROR: &str = "OPERATION_RUNTIME_ERROR";
pub const INVALID_BRANCH_TARGET: &str = "INVALID_BRANCH_TARGET";
pub const INVALID_CHILD_REFERENCE: &str = "INVALID_CHILD_REFERENCE";
pub const STEP_LIMIT_EXCEEDED: &str = "STEP_LIMIT_EXCEEDED";
pub const DISPATCH_DEPTH_EXCEEDED: &str = "DISPATCH_DEPTH_EXCEEDED";

/// Errors raised while executing an action program
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionError {
    /// Unknown program id
    #[error("action '{action_id}' not found")]
    ActionNotFound { action_id: String },

    /// A program references a sequence that does not exist
    #[error("sequence '{sequence_id}' not found")]
    SequenceNotFound { sequence_id: String },

    /// A sequence references a block that does not exist
    #[error("block '{block_id}' not found")]
    BlockNotFound { block_id: String },

    /// Operation is neither builtin, async, nor a registered method
    #[error("operation '{operation}' not found (block '{block_id}')")]
    ActionOperationNotFound { operation: String, block_id: String },

    /// A handler failed or an async leaf reported an error
    #[error("operation '{operation}' failed in block '{block_id}': {message}")]
    OperationRuntimeError {
        operation: String,
        block_id: String,
        message: String,
    },

    /// A branch jumped outside its sequence or program
    #[error("branch target {target} out of range (length {len})")]
    InvalidBranchTarget { target: usize, len: usize },

    /// A child index points at a position without a result, or its path does not fit
    #[error("invalid child reference {child} from position {position}: {reason}")]
    InvalidChildReference {
        position: usize,
        child: usize,
        reason: String,
    },

    #[error("step limit of {limit} exceeded")]
    StepLimitExceeded { limit: usize },

    #[error("nested dispatch depth of {limit} exceeded")]
    DispatchDepthExceeded { limit: usize },
}

impl ActionError {
    /// Stable code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            ActionError::ActionNotFound { .. } => ACTION_NOT_FOUND,
            ActionError::SequenceNotFound { .. } => SEQUENCE_NOT_FOUND,
            ActionError::BlockNotFound { .. } => BLOCK_NOT_FOUND,
            ActionError::ActionOperationNotFound { .. } => OPERATION_NOT_FOUND,
            ActionError::OperationRuntimeError { .. } => OPERATION_RUNTIME_ERROR,
            ActionError::InvalidBranchTarget { .. } => INVALID_BRANCH_TARGET,
            ActionError::InvalidChildReference { .. } => INVALID_CHILD_REFERENCE,
            ActionError::StepLimitExceeded { .. } => STEP_LIMIT_EXCEEDED,
            ActionError::DispatchDepthExceeded { .. } => DISPATCH_DEPTH_EXCEEDED,
        }
    }

    pub fn runtime(
        operation: impl Into<String>,
        block_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ActionError::OperationRuntimeError {
            operation: operation.into(),
            block_id: block_id.into(),
            message: message.into(),
        }
    }
}

/// Failure inside an operation handler, before block identity is attached
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OperationError {
    #[error("{0}")]
    Invalid(String),

    /// Errors from nested dispatches or branching pass through unchanged
    #[error(transparent)]
    Action(#[from] ActionError),
}

impl OperationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        OperationError::Invalid(message.into())
    }

    /// Attach the failing block's identity
    pub fn into_action_error(self, operation: &str, block_id: &str) -> ActionError {
        match self {
            OperationError::Invalid(message) => ActionError::runtime(operation, block_id, message),
            OperationError::Action(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_codes_and_messages() {
        let err = ActionError::BlockNotFound {
            block_id: "b7".to_string(),
        };
        assert_eq!(err.code(), BLOCK_NOT_FOUND);
        assert_eq!(err.to_string(), "block 'b7' not found");
    }

    #[test]
    fn test_serializes_with_code_tag() {
        let err = ActionError::runtime("operator/eval", "b1", "bad");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "code": "OPERATION_RUNTIME_ERROR",
                "operation": "operator/eval",
                "block_id": "b1",
                "message": "bad"
            })
        );
    }

    #[test]
    fn test_operation_error_keeps_nested_action_error() {
        let nested = ActionError::ActionNotFound {
            action_id: "x".to_string(),
        };
        let err = OperationError::from(nested.clone()).into_action_error("action/dispatch", "b1");
        assert_eq!(err, nested);

        let err = OperationError::invalid("boom").into_action_error("data/getValue", "b2");
        assert_eq!(err.code(), OPERATION_RUNTIME_ERROR);
    }
}
