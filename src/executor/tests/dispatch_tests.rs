//! Tests for ordering, aggregate results and nested dispatch

use super::helpers::{dispatcher, dispatcher_with_config, record, request};
use crate::config::EngineConfig;
use crate::executor::ActionError;
use crate::types::{DispatchContext, DispatchRequest};
use serde_json::json;

/* ===================== Ordering ===================== */

#[tokio::test]
async fn test_blocks_run_once_in_declared_order() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {"a": record("a"), "b": record("b"), "c": record("c"), "d": record("d")},
        "sequences": {
            "s1": [{"blockId": "a"}, {"blockId": "b"}],
            "s2": [{"blockId": "c"}, {"blockId": "d"}]
        },
        "actions": {"go": ["s1", "s2"]}
    }));

    let outcome = dispatcher.dispatch("go", request("w1", json!({}))).await.unwrap();

    assert!(outcome.is_ok());
    assert_eq!(log.entries(), vec!["a", "b", "c", "d"]);
    assert_eq!(outcome.result(0), Some(&json!({"tag": "b"})));
    assert_eq!(outcome.result(1), Some(&json!({"tag": "d"})));
}

#[tokio::test]
async fn test_same_sequence_twice_in_program() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {"a": record("a")},
        "sequences": {"s1": [{"blockId": "a"}]},
        "actions": {"twice": ["s1", "s1"]}
    }));

    let outcome = dispatcher.dispatch("twice", request("w1", json!({}))).await.unwrap();

    assert_eq!(log.entries(), vec!["a", "a"]);
    assert_eq!(outcome.results.len(), 2);
}

#[tokio::test]
async fn test_empty_sequence_leaves_slot_unset() {
    let (dispatcher, _) = dispatcher(json!({
        "blocks": {"a": record("a")},
        "sequences": {"empty": [], "s1": [{"blockId": "a"}]},
        "actions": {"go": ["empty", "s1"]}
    }));

    let outcome = dispatcher.dispatch("go", request("w1", json!({}))).await.unwrap();

    assert!(outcome.is_ok());
    assert_eq!(outcome.result(0), None);
    assert_eq!(outcome.result(1), Some(&json!({"tag": "a"})));
    assert_eq!(outcome.results_json(), json!({"1": {"tag": "a"}}));
}

/* ===================== Values ===================== */

#[tokio::test]
async fn test_sequence_value_feeds_later_sequence() {
    let (dispatcher, _) = dispatcher(json!({
        "blocks": {
            "price": {"operation": "action/getPayloadValue", "parameters": "price"},
            "total": {"operation": "operator/eval", "parameters": {
                "name": "*",
                "values": [{"$from": "sequence", "index": 0}, 2]
            }}
        },
        "sequences": {"s1": [{"blockId": "price"}], "s2": [{"blockId": "total"}]},
        "actions": {"double": ["s1", "s2"]}
    }));

    let outcome = dispatcher
        .dispatch("double", request("w1", json!({"price": 21})))
        .await
        .unwrap();

    assert_eq!(outcome.result(1), Some(&json!(42)));
}

#[tokio::test]
async fn test_context_id_is_grouping_id() {
    let (dispatcher, _) = dispatcher(json!({
        "blocks": {
            "ctx": {"operation": "action/getContextValue", "parameters": {"$keys": {"scope": "id", "lang": "lang"}}}
        },
        "sequences": {"s1": [{"blockId": "ctx"}]},
        "actions": {"who": ["s1"]}
    }));

    let context: DispatchContext =
        serde_json::from_value(json!({"sectionId": "sec-1", "lang": "en"})).unwrap();
    let outcome = dispatcher
        .dispatch("who", DispatchRequest::new(context, json!(null)))
        .await
        .unwrap();

    assert_eq!(outcome.result(0), Some(&json!({"scope": "sec-1", "lang": "en"})));
}

#[tokio::test]
async fn test_block_value_query() {
    let (dispatcher, _) = dispatcher(json!({
        "blocks": {
            "user": {"operation": "action/getPayloadValue", "parameters": null},
            "name": {"operation": "action/getBlockValue", "parameters": {"index": 0, "query": {"$key": "profile.name"}}}
        },
        "sequences": {"s1": [{"blockId": "user"}, {"blockId": "name"}]},
        "actions": {"name": ["s1"]}
    }));

    let outcome = dispatcher
        .dispatch("name", request("w1", json!({"profile": {"name": "Ada"}})))
        .await
        .unwrap();

    assert_eq!(outcome.result(0), Some(&json!("Ada")));
}

/* ===================== Nested Dispatch ===================== */

#[tokio::test]
async fn test_nested_dispatch_returns_inner_results() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {
            "x": {"operation": "action/getPayloadValue", "parameters": "x"},
            "call": {"operation": "action/dispatch", "parameters": {"id": "inner", "payload": {"x": 7}}},
            "after": record("after")
        },
        "sequences": {"si": [{"blockId": "x"}], "so": [{"blockId": "call"}, {"blockId": "after"}]},
        "actions": {"inner": ["si"], "outer": ["so"]}
    }));

    let outcome = dispatcher.dispatch("outer", request("w1", json!({"x": 1}))).await.unwrap();

    assert!(outcome.is_ok());
    assert_eq!(log.entries(), vec!["after"]);
    assert_eq!(outcome.result(0), Some(&json!({"tag": "after"})));
}

#[tokio::test]
async fn test_nested_dispatch_inherits_payload() {
    let (dispatcher, _) = dispatcher(json!({
        "blocks": {
            "x": {"operation": "action/getPayloadValue", "parameters": "x"},
            "call": {"operation": "action/dispatch", "parameters": {"id": "inner"}}
        },
        "sequences": {"si": [{"blockId": "x"}], "so": [{"blockId": "call"}]},
        "actions": {"inner": ["si"], "outer": ["so"]}
    }));

    let outcome = dispatcher.dispatch("outer", request("w1", json!({"x": 3}))).await.unwrap();

    assert_eq!(outcome.result(0), Some(&json!({"0": 3})));
}

#[tokio::test]
async fn test_recursive_dispatch_hits_depth_limit() {
    let config = EngineConfig {
        max_dispatch_depth: 3,
        ..EngineConfig::default()
    };
    let (dispatcher, _) = dispatcher_with_config(
        json!({
            "blocks": {"again": {"operation": "action/dispatch", "parameters": {"id": "loop"}}},
            "sequences": {"s1": [{"blockId": "again"}]},
            "actions": {"loop": ["s1"]}
        }),
        config,
    );

    let outcome = dispatcher.dispatch("loop", request("w1", json!({}))).await.unwrap();

    assert_eq!(outcome.error, Some(ActionError::DispatchDepthExceeded { limit: 3 }));
    assert!(outcome.results.is_empty());
}

/* ===================== Concurrency ===================== */

#[tokio::test]
async fn test_concurrent_dispatches_keep_own_state() {
    let (dispatcher, _) = dispatcher(json!({
        "blocks": {
            "n": {"operation": "action/getPayloadValue", "parameters": "n"},
            "inc": {"operation": "operator/eval", "parameters": {"name": "+", "values": [null, 1]}}
        },
        "sequences": {"s1": [
            {"blockId": "n", "path": ["inc", "values", 0]},
            {"blockId": "inc", "path": ["inc"], "children": [0]}
        ]},
        "actions": {"inc": ["s1"]}
    }));

    let (a, b, c) = tokio::join!(
        dispatcher.dispatch("inc", request("w1", json!({"n": 1}))),
        dispatcher.dispatch("inc", request("w2", json!({"n": 10}))),
        dispatcher.dispatch("inc", request("w3", json!({"n": 100}))),
    );

    assert_eq!(a.unwrap().result(0), Some(&json!(2)));
    assert_eq!(b.unwrap().result(0), Some(&json!(11)));
    assert_eq!(c.unwrap().result(0), Some(&json!(101)));

    let template = dispatcher.store().block("inc").unwrap();
    assert_eq!(*template.parameters, json!({"name": "+", "values": [null, 1]}));
}

#[test]
fn test_dispatch_from_sync_code() {
    let (dispatcher, log) = dispatcher(json!({
        "blocks": {"a": record("a")},
        "sequences": {"s1": [{"blockId": "a"}]},
        "actions": {"go": ["s1"]}
    }));

    let outcome = tokio_test::block_on(dispatcher.dispatch("go", request("w1", json!({}))));

    assert!(outcome.unwrap().is_ok());
    assert_eq!(log.entries(), vec!["a"]);
}
