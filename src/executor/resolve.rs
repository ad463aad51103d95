//! Value resolution
//!
//! One query language for context, payload, block and sequence lookups:
//!
//! - `null` - the whole value
//! - `"name"` / `3` - a direct key or index
//! - `{"$key": "a.b.c"}` - a dot path
//! - `{"$keys": {"out": "a.b", ...}}` - several dot paths under new names
//! - `{"$index": [1, "a.b"]}` - an array element, then optional dot paths
//! - `{"$indexes": [[0, "a"], [2]]}` - several `$index` lookups as a list
//! - `["a", "b"]` - pick keys into `{"a": .., "b": ..}`
//!
//! Missing keys resolve to `null`, never to an error.

use serde_json::{Map, Value as JsonValue};

/// Resolve `query` against `source`
pub fn resolve(source: &JsonValue, query: &JsonValue) -> JsonValue {
    match query {
        JsonValue::Null => source.clone(),

        JsonValue::String(key) => lookup_key(source, key).cloned().unwrap_or(JsonValue::Null),

        JsonValue::Number(n) => n
            .as_u64()
            .and_then(|idx| source.get(idx as usize))
            .cloned()
            .unwrap_or(JsonValue::Null),

        JsonValue::Object(obj) => {
            if let Some(path) = obj.get("$key") {
                return path
                    .as_str()
                    .and_then(|p| get_path(source, p))
                    .cloned()
                    .unwrap_or(JsonValue::Null);
            }

            if let Some(keys) = obj.get("$keys").and_then(|k| k.as_object()) {
                return resolve_keys(source, keys);
            }

            if let Some(parts) = obj.get("$index").and_then(|i| i.as_array()) {
                return resolve_index(source, parts);
            }

            if let Some(lookups) = obj.get("$indexes").and_then(|i| i.as_array()) {
                return JsonValue::Array(
                    lookups
                        .iter()
                        .map(|parts| match parts.as_array() {
                            Some(parts) => resolve_index(source, parts),
                            None => JsonValue::Null,
                        })
                        .collect(),
                );
            }

            JsonValue::Null
        }

        // Legacy pick form: a list of keys copied into a new object
        JsonValue::Array(keys) => {
            let mut picked = Map::new();
            for key in keys.iter().filter_map(|k| k.as_str()) {
                picked.insert(
                    key.to_string(),
                    lookup_key(source, key).cloned().unwrap_or(JsonValue::Null),
                );
            }
            JsonValue::Object(picked)
        }

        JsonValue::Bool(_) => JsonValue::Null,
    }
}

/// Walk a dot path (`a.b.0.c`) through objects and arrays
pub fn get_path<'a>(source: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    if path.is_empty() {
        return Some(source);
    }

    let mut current = source;
    for segment in path.split('.') {
        current = lookup_key(current, segment)?;
    }
    Some(current)
}

/// Object key, or array index when the key is numeric
fn lookup_key<'a>(source: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    match source {
        JsonValue::Object(obj) => obj.get(key),
        JsonValue::Array(arr) => key.parse::<usize>().ok().and_then(|idx| arr.get(idx)),
        _ => None,
    }
}

fn resolve_keys(source: &JsonValue, keys: &Map<String, JsonValue>) -> JsonValue {
    let mut out = Map::new();
    for (name, path) in keys {
        let value = path
            .as_str()
            .and_then(|p| get_path(source, p))
            .cloned()
            .unwrap_or(JsonValue::Null);
        out.insert(name.clone(), value);
    }
    JsonValue::Object(out)
}

/// `[index, path?, path?...]`
fn resolve_index(source: &JsonValue, parts: &[JsonValue]) -> JsonValue {
    let Some(index) = parts.first().and_then(|i| i.as_u64()) else {
        return JsonValue::Null;
    };

    let mut current = match source.get(index as usize) {
        Some(v) => v,
        None => return JsonValue::Null,
    };

    for path in &parts[1..] {
        let Some(path) = path.as_str() else {
            return JsonValue::Null;
        };
        current = match get_path(current, path) {
            Some(v) => v,
            None => return JsonValue::Null,
        };
    }

    current.clone()
}
