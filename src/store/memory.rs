//! In-memory value store

use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::value::{
    compose_id, DeleteOptions, DeleteResult, GetOptions, GetResult, SetOptions, SetResult,
    UpdateMethod, UpdateOptions, ValueStore,
};

type Collection = HashMap<String, JsonValue>;

/// Value store backed by nested hash maps
#[derive(Debug, Default)]
pub struct MemoryValueStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from `{ collection: { id: value } }`
    pub fn from_json(seed: &JsonValue) -> Self {
        let store = Self::new();
        if let Some(collections) = seed.as_object() {
            let mut guard = store.collections.write().unwrap_or_else(|e| e.into_inner());
            for (name, docs) in collections {
                let collection = guard.entry(name.clone()).or_default();
                if let Some(docs) = docs.as_object() {
                    for (id, value) in docs {
                        collection.insert(id.clone(), value.clone());
                    }
                }
            }
        }
        store
    }

    /// Snapshot of every collection as `{ collection: { id: value } }`
    pub fn snapshot(&self) -> JsonValue {
        let guard = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let collections: Map<String, JsonValue> = guard
            .iter()
            .map(|(name, docs)| {
                let docs: Map<String, JsonValue> =
                    docs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                (name.clone(), JsonValue::Object(docs))
            })
            .collect();
        JsonValue::Object(collections)
    }
}

impl ValueStore for MemoryValueStore {
    fn get(&self, collection: &str, options: &GetOptions) -> GetResult {
        let guard = self.collections.read().unwrap_or_else(|e| e.into_inner());
        let docs = guard.get(collection);

        let item = match &options.id {
            Some(id) => {
                let id = compose_id(
                    options.prefix_id.as_deref(),
                    id,
                    options.suffix_id.as_deref(),
                );
                docs.and_then(|d| d.get(&id)).cloned().unwrap_or(JsonValue::Null)
            }
            None => {
                let all: Map<String, JsonValue> = docs
                    .map(|d| d.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                JsonValue::Object(all)
            }
        };

        GetResult {
            is_empty: is_empty(&item),
            item,
            expand: None,
            is_expand_empty: None,
        }
    }

    fn set(&self, collection: &str, value: JsonValue, options: &SetOptions) -> SetResult {
        let base = options
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let id = compose_id(
            options.prefix_id.as_deref(),
            &base,
            options.suffix_id.as_deref(),
        );

        let mut guard = self.collections.write().unwrap_or_else(|e| e.into_inner());
        let docs = guard.entry(collection.to_string()).or_default();
        let existing = docs.get(&id).cloned();

        let next = if let Some(update) = &options.update {
            match apply_update(existing, value, update) {
                Ok(v) => v,
                Err(error) => return SetResult::invalid(id, error),
            }
        } else if options.merge && !options.replace {
            match (existing, value) {
                (Some(JsonValue::Object(mut current)), JsonValue::Object(incoming)) => {
                    for (k, v) in incoming {
                        current.insert(k, v);
                    }
                    JsonValue::Object(current)
                }
                (None | Some(JsonValue::Null), incoming @ JsonValue::Object(_)) => incoming,
                _ => return SetResult::invalid(id, "merge requires object values"),
            }
        } else {
            value
        };

        docs.insert(id.clone(), next);
        SetResult::valid(id)
    }

    fn delete(&self, collection: &str, id: &str, _options: &DeleteOptions) -> DeleteResult {
        let mut guard = self.collections.write().unwrap_or_else(|e| e.into_inner());
        let deleted = guard
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false);
        DeleteResult { deleted }
    }
}

fn is_empty(item: &JsonValue) -> bool {
    match item {
        JsonValue::Null => true,
        JsonValue::Object(obj) => obj.is_empty(),
        JsonValue::Array(arr) => arr.is_empty(),
        _ => false,
    }
}

/// Apply an array update to an existing document
fn apply_update(
    existing: Option<JsonValue>,
    value: JsonValue,
    update: &UpdateOptions,
) -> Result<JsonValue, String> {
    let mut items = match existing {
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::Array(items)) => items,
        Some(_) => return Err("update requires an array document".to_string()),
    };

    let incoming = match value {
        JsonValue::Array(values) => values,
        other => vec![other],
    };

    match update.method {
        UpdateMethod::Push => items.extend(incoming),
        UpdateMethod::Unshift => {
            items.splice(0..0, incoming);
        }
        UpdateMethod::Pull => items.retain(|item| !incoming.contains(item)),
        UpdateMethod::Splice => {
            let position = update.position.unwrap_or(items.len()).min(items.len());
            let end = position
                .saturating_add(update.delete_count.unwrap_or(0))
                .min(items.len());
            items.splice(position..end, incoming);
        }
    }

    Ok(JsonValue::Array(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set_opts(id: &str) -> SetOptions {
        SetOptions {
            id: Some(id.to_string()),
            ..SetOptions::default()
        }
    }

    fn get_opts(id: &str) -> GetOptions {
        GetOptions {
            id: Some(id.to_string()),
            ..GetOptions::default()
        }
    }

    #[test]
    fn test_set_then_get() {
        let store = MemoryValueStore::new();
        let result = store.set("user", json!({"name": "ada"}), &set_opts("u1"));
        assert!(result.is_valid);
        assert_eq!(result.id, "u1");

        let got = store.get("user", &get_opts("u1"));
        assert_eq!(got.item, json!({"name": "ada"}));
        assert!(!got.is_empty);

        let missing = store.get("user", &get_opts("u2"));
        assert!(missing.is_empty);
        assert_eq!(missing.item, JsonValue::Null);
    }

    #[test]
    fn test_generated_id_with_prefix() {
        let store = MemoryValueStore::new();
        let opts = SetOptions {
            prefix_id: Some("p_".to_string()),
            ..SetOptions::default()
        };
        let result = store.set("notes", json!("hi"), &opts);
        assert!(result.id.starts_with("p_"));
        assert_eq!(result.id.len(), 2 + 36);
    }

    #[test]
    fn test_merge_objects() {
        let store = MemoryValueStore::new();
        store.set("c", json!({"a": 1, "b": 2}), &set_opts("x"));
        let opts = SetOptions {
            merge: true,
            ..set_opts("x")
        };
        store.set("c", json!({"b": 3, "c": 4}), &opts);
        assert_eq!(
            store.get("c", &get_opts("x")).item,
            json!({"a": 1, "b": 3, "c": 4})
        );

        let bad = store.set("c", json!(5), &opts);
        assert!(!bad.is_valid);
    }

    #[test]
    fn test_array_updates() {
        let store = MemoryValueStore::new();
        store.set("list", json!([1, 2, 3]), &set_opts("l"));

        let update = |method, position, delete_count| SetOptions {
            update: Some(UpdateOptions {
                method,
                position,
                delete_count,
            }),
            ..set_opts("l")
        };

        store.set("list", json!(4), &update(UpdateMethod::Push, None, None));
        store.set("list", json!(0), &update(UpdateMethod::Unshift, None, None));
        assert_eq!(store.get("list", &get_opts("l")).item, json!([0, 1, 2, 3, 4]));

        store.set("list", json!([1, 3]), &update(UpdateMethod::Pull, None, None));
        assert_eq!(store.get("list", &get_opts("l")).item, json!([0, 2, 4]));

        store.set(
            "list",
            json!(["a", "b"]),
            &update(UpdateMethod::Splice, Some(1), Some(1)),
        );
        assert_eq!(
            store.get("list", &get_opts("l")).item,
            json!([0, "a", "b", 4])
        );

        store.set("list", json!({"k": 1}), &set_opts("obj"));
        let bad = store.set("list", json!(1), &SetOptions {
            update: Some(UpdateOptions {
                method: UpdateMethod::Push,
                position: None,
                delete_count: None,
            }),
            ..set_opts("obj")
        });
        assert!(!bad.is_valid);
    }

    #[test]
    fn test_splice_delete_count_past_end() {
        let store = MemoryValueStore::new();
        store.set("list", json!([1, 2, 3]), &set_opts("l"));

        let result = store.set(
            "list",
            json!("tail"),
            &SetOptions {
                update: Some(UpdateOptions {
                    method: UpdateMethod::Splice,
                    position: Some(1),
                    delete_count: Some(usize::MAX),
                }),
                ..set_opts("l")
            },
        );

        assert!(result.is_valid);
        assert_eq!(store.get("list", &get_opts("l")).item, json!([1, "tail"]));
    }

    #[test]
    fn test_delete_and_collection_get() {
        let store = MemoryValueStore::from_json(&json!({"c": {"a": 1, "b": 2}}));
        let all = store.get("c", &GetOptions::default());
        assert_eq!(all.item, json!({"a": 1, "b": 2}));

        assert!(store.delete("c", "a", &DeleteOptions::default()).deleted);
        assert!(!store.delete("c", "a", &DeleteOptions::default()).deleted);
        assert!(!store.delete("nope", "a", &DeleteOptions::default()).deleted);
        assert_eq!(store.snapshot(), json!({"c": {"b": 2}}));
    }
}
