//! Tests for block-level and sequence-level branching

use super::helpers::{dispatcher, dispatcher_with_config, record, request};
use crate::config::EngineConfig;
use crate::executor::ActionError;
use serde_json::{json, Value as JsonValue};

/// `action/ifElse` testing `payload.flag == true`
fn flag_condition(then: JsonValue, otherwise: JsonValue) -> JsonValue {
    json!({
        "operation": "action/ifElse",
        "parameters": {
            "if": [{"from": {"$from": "payload", "query": "flag"}, "op": "==", "to": true}],
            "then": then,
            "else": otherwise
        }
    })
}

/* ===================== Block Level ===================== */

fn block_level_file() -> JsonValue {
    json!({
        "blocks": {
            "cond": flag_condition(json!([2]), json!([1, 3])),
            "a": record("a"), "b": record("b"), "c": record("c")
        },
        "sequences": {"s1": [
            {"blockId": "cond"}, {"blockId": "a"}, {"blockId": "b"}, {"blockId": "c"}
        ]},
        "actions": {"pick": ["s1"]}
    })
}

#[tokio::test]
async fn test_block_level_then_visits_exactly_targets() {
    let (dispatcher, log) = dispatcher(block_level_file());

    let outcome = dispatcher
        .dispatch("pick", request("w1", json!({"flag": true})))
        .await
        .unwrap();

    assert_eq!(log.entries(), vec!["b"]);
    assert_eq!(outcome.result(0), Some(&json!({"tag": "b"})));
}

#[tokio::test]
async fn test_block_level_else_visits_exactly_targets() {
    let (dispatcher, log) = dispatcher(block_level_file());

    dispatcher
        .dispatch("pick", request("w1", json!({"flag": false})))
        .await
        .unwrap();

    assert_eq!(log.entries(), vec!["a", "c"]);
}

#[tokio::test]
async fn test_empty_targets_end_sequence_only() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {
            "cond": flag_condition(json!([]), json!([])),
            "a": record("a"),
            "next": record("next")
        },
        "sequences": {
            "s1": [{"blockId": "cond"}, {"blockId": "a"}],
            "s2": [{"blockId": "next"}]
        },
        "actions": {"stop": ["s1", "s2"]}
    }));

    let outcome = dispatcher
        .dispatch("stop", request("w1", json!({"flag": true})))
        .await
        .unwrap();

    assert!(outcome.is_ok());
    assert_eq!(log.entries(), vec!["next"]);
    assert_eq!(outcome.result(0), Some(&json!(true)));
}

#[tokio::test]
async fn test_joined_conditions_fold_left_to_right() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {
            "cond": {"operation": "action/ifElse", "parameters": {
                "if": [
                    {"from": 1, "op": "==", "to": 2},
                    {"andOr": "||"},
                    {"from": {"$from": "payload", "query": "n"}, "op": ">", "to": 5},
                    {"andOr": "&&"},
                    {"from": "x", "op": "!=", "to": "y"}
                ],
                "then": [1],
                "else": [2]
            }},
            "yes": record("yes"),
            "no": record("no")
        },
        "sequences": {"s1": [{"blockId": "cond"}, {"blockId": "yes"}, {"blockId": "no"}]},
        "actions": {"check": ["s1"]}
    }));

    dispatcher.dispatch("check", request("w1", json!({"n": 9}))).await.unwrap();
    dispatcher.dispatch("check", request("w1", json!({"n": 1}))).await.unwrap();

    assert_eq!(log.entries(), vec!["yes", "no"]);
}

#[tokio::test]
async fn test_invalid_block_target_fails_sequence() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {"cond": flag_condition(json!([9]), json!([])), "a": record("a")},
        "sequences": {"s1": [{"blockId": "cond"}, {"blockId": "a"}]},
        "actions": {"bad": ["s1"]}
    }));

    let outcome = dispatcher
        .dispatch("bad", request("w1", json!({"flag": true})))
        .await
        .unwrap();

    assert_eq!(
        outcome.error,
        Some(ActionError::InvalidBranchTarget { target: 9, len: 2 })
    );
    assert_eq!(outcome.result(0), None);
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_self_loop_hits_step_limit() {
    let config = EngineConfig {
        max_steps: 50,
        ..EngineConfig::default()
    };
    let (dispatcher, _) = dispatcher_with_config(
        json!({
            "blocks": {"cond": flag_condition(json!([0]), json!([0])), "a": record("a")},
            "sequences": {"s1": [{"blockId": "cond"}, {"blockId": "a"}]},
            "actions": {"spin": ["s1"]}
        }),
        config,
    );

    let outcome = dispatcher
        .dispatch("spin", request("w1", json!({"flag": true})))
        .await
        .unwrap();

    assert_eq!(outcome.error, Some(ActionError::StepLimitExceeded { limit: 50 }));
}

/* ===================== Sequence Level ===================== */

#[tokio::test]
async fn test_terminal_condition_with_empty_targets_ends_program() {
    // S1 yields true, S2 tests it with empty then/else, S3 must never run
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {
            "yes": {"operation": "action/getValue", "parameters": {"value": true}},
            "cond": {"operation": "action/ifElse", "parameters": {
                "if": [{"from": {"$from": "sequence", "index": 0}, "op": "==", "to": true}],
                "then": [],
                "else": []
            }},
            "later": record("later")
        },
        "sequences": {
            "s1": [{"blockId": "yes"}],
            "s2": [{"blockId": "cond"}],
            "s3": [{"blockId": "later"}]
        },
        "actions": {"scenario": ["s1", "s2", "s3"]}
    }));

    let outcome = dispatcher
        .dispatch("scenario", request("w1", json!({})))
        .await
        .unwrap();

    assert!(outcome.is_ok());
    assert_eq!(outcome.result(0), Some(&json!(true)));
    assert_eq!(outcome.result(1), Some(&json!(true)));
    assert_eq!(outcome.result(2), None);
    assert!(log.entries().is_empty());
}

#[tokio::test]
async fn test_terminal_condition_jumps_across_program() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {
            "cond": flag_condition(json!([3, 1]), json!([2])),
            "a": record("a"), "b": record("b"), "c": record("c")
        },
        "sequences": {
            "route": [{"blockId": "cond"}],
            "sa": [{"blockId": "a"}],
            "sb": [{"blockId": "b"}],
            "sc": [{"blockId": "c"}]
        },
        "actions": {"route": ["route", "sa", "sb", "sc"]}
    }));

    let outcome = dispatcher
        .dispatch("route", request("w1", json!({"flag": true})))
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["c", "a"]);
    assert_eq!(outcome.result(2), None);

    dispatcher
        .dispatch("route", request("w1", json!({"flag": false})))
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_terminal_condition_out_of_program() {
    let (dispatcher, _) = dispatcher(json!({
        "blocks": {"cond": flag_condition(json!([5]), json!([]))},
        "sequences": {"s1": [{"blockId": "cond"}]},
        "actions": {"far": ["s1"]}
    }));

    let outcome = dispatcher
        .dispatch("far", request("w1", json!({"flag": true})))
        .await
        .unwrap();

    assert_eq!(outcome.result(0), Some(&json!(true)));
    assert_eq!(
        outcome.error,
        Some(ActionError::InvalidBranchTarget { target: 5, len: 1 })
    );
}
