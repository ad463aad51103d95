//! `action/ifElse`: evaluate conditions and choose a continuation
//!
//! ```json
//! {
//!   "if": [
//!     {"from": 1, "op": "==", "to": 1},
//!     {"andOr": "&&"},
//!     {"from": "a", "op": "!=", "to": "b"}
//!   ],
//!   "then": [2],
//!   "else": [3, 4]
//! }
//! ```
//!
//! Conditions fold strictly left to right. Whether the targets are block
//! positions or sequence positions is decided by the block processor.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::{parse_params, Operation, OperationOutput};
use crate::executor::errors::OperationError;
use crate::executor::operators;

#[derive(Debug, Deserialize)]
struct IfElse {
    #[serde(rename = "if")]
    conditions: Vec<ConditionItem>,
    #[serde(default)]
    then: Vec<usize>,
    #[serde(default, rename = "else")]
    otherwise: Vec<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConditionItem {
    Comparison {
        from: JsonValue,
        op: String,
        #[serde(default)]
        to: JsonValue,
    },
    Join {
        #[serde(rename = "andOr")]
        and_or: String,
    },
}

pub fn if_else(params: &JsonValue) -> Result<OperationOutput, OperationError> {
    let p: IfElse = parse_params(Operation::ActionIfElse, params)?;
    let result = evaluate(&p.conditions)?;
    let targets = if result { p.then } else { p.otherwise };
    Ok(OperationOutput::Branch { result, targets })
}

/// Reduce the condition list to `[bool, token, bool, ...]` and fold it
fn evaluate(conditions: &[ConditionItem]) -> Result<bool, OperationError> {
    let mut folded = Vec::with_capacity(conditions.len());

    for (i, item) in conditions.iter().enumerate() {
        let expect_comparison = i % 2 == 0;
        match (item, expect_comparison) {
            (ConditionItem::Comparison { from, op, to }, true) => {
                let value = operators::eval(op, &[from.clone(), to.clone()])
                    .map_err(OperationError::invalid)?;
                folded.push(JsonValue::Bool(operators::is_truthy(&value)));
            }
            (ConditionItem::Join { and_or }, false) => {
                folded.push(JsonValue::String(and_or.clone()));
            }
            (_, true) => {
                return Err(OperationError::invalid(format!(
                    "condition {} must be a comparison",
                    i
                )))
            }
            (_, false) => {
                return Err(OperationError::invalid(format!(
                    "condition {} must be an andOr token",
                    i
                )))
            }
        }
    }

    operators::compare(&folded).map_err(OperationError::invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn branch(params: JsonValue) -> (bool, Vec<usize>) {
        match if_else(&params).unwrap() {
            OperationOutput::Branch { result, targets } => (result, targets),
            other => panic!("Expected branch, got {:?}", other),
        }
    }

    #[test]
    fn test_single_condition_true() {
        let (result, targets) = branch(json!({
            "if": [{"from": 5, "op": ">", "to": 3}],
            "then": [1, 2],
            "else": [3]
        }));
        assert!(result);
        assert_eq!(targets, vec![1, 2]);
    }

    #[test]
    fn test_single_condition_false() {
        let (result, targets) = branch(json!({
            "if": [{"from": "a", "op": "==", "to": "b"}],
            "then": [1],
            "else": [3]
        }));
        assert!(!result);
        assert_eq!(targets, vec![3]);
    }

    #[test]
    fn test_empty_targets_are_valid() {
        let (result, targets) = branch(json!({
            "if": [{"from": true, "op": "==", "to": true}],
            "then": [],
            "else": []
        }));
        assert!(result);
        assert!(targets.is_empty());

        let (_, targets) = branch(json!({"if": [{"from": 1, "op": "!!"}]}));
        assert!(targets.is_empty());
    }

    #[test]
    fn test_sequential_fold() {
        // (1 == 1 || 1 == 2) && 2 == 3 -> false
        let (result, _) = branch(json!({
            "if": [
                {"from": 1, "op": "==", "to": 1},
                {"andOr": "||"},
                {"from": 1, "op": "==", "to": 2},
                {"andOr": "&&"},
                {"from": 2, "op": "==", "to": 3}
            ]
        }));
        assert!(!result);
    }

    #[test]
    fn test_malformed_conditions() {
        assert!(if_else(&json!({"if": []})).is_err());
        assert!(if_else(&json!({"if": [{"andOr": "&&"}]})).is_err());
        assert!(if_else(&json!({
            "if": [{"from": 1, "op": "==", "to": 1}, {"from": 1, "op": "==", "to": 1}]
        }))
        .is_err());
        assert!(if_else(&json!({"if": [{"from": 1, "op": "<>", "to": 1}]})).is_err());
        assert!(if_else(&json!({"then": [1]})).is_err());
    }
}
