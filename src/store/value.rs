//! Value store contract
//!
//! The narrow get/set/delete surface operation handlers use. Relation
//! tracking, merge and update semantics belong to the implementation.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Options for reading a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetOptions {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub prefix_id: Option<String>,

    #[serde(default)]
    pub suffix_id: Option<String>,

    /// Store specific options (expansion etc.), passed through
    #[serde(default)]
    pub options: JsonValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResult {
    pub item: JsonValue,
    pub is_empty: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<Vec<JsonValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expand_empty: Option<bool>,
}

/// Array update methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMethod {
    Push,
    Unshift,
    Pull,
    Splice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptions {
    pub method: UpdateMethod,

    /// Insert position for `splice`
    #[serde(default)]
    pub position: Option<usize>,

    /// Elements removed at `position` for `splice`
    #[serde(default)]
    pub delete_count: Option<usize>,
}

/// Options for writing a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOptions {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub prefix_id: Option<String>,

    #[serde(default)]
    pub suffix_id: Option<String>,

    #[serde(default)]
    pub merge: bool,

    #[serde(default)]
    pub replace: bool,

    #[serde(default)]
    pub update: Option<UpdateOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetResult {
    pub id: String,
    pub is_valid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SetResult {
    pub fn valid(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOptions {
    #[serde(default)]
    pub cascade: bool,

    #[serde(default)]
    pub listeners: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub deleted: bool,
}

/// Document store consumed by operation handlers
///
/// Implementations own their concurrency discipline; the engine calls these
/// from whichever task is driving a dispatch.
pub trait ValueStore: Send + Sync {
    fn get(&self, collection: &str, options: &GetOptions) -> GetResult;

    fn set(&self, collection: &str, value: JsonValue, options: &SetOptions) -> SetResult;

    fn delete(&self, collection: &str, id: &str, options: &DeleteOptions) -> DeleteResult;
}

/// Compose a document id from optional prefix and suffix
pub fn compose_id(prefix: Option<&str>, id: &str, suffix: Option<&str>) -> String {
    format!("{}{}{}", prefix.unwrap_or(""), id, suffix.unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compose_id() {
        assert_eq!(compose_id(Some("pre_"), "x", Some("_post")), "pre_x_post");
        assert_eq!(compose_id(None, "x", None), "x");
    }

    #[test]
    fn test_set_options_from_json() {
        let opts: SetOptions = serde_json::from_value(json!({
            "id": "a",
            "update": {"method": "splice", "position": 1, "deleteCount": 2}
        }))
        .unwrap();
        assert_eq!(opts.id.as_deref(), Some("a"));
        let update = opts.update.unwrap();
        assert_eq!(update.method, UpdateMethod::Splice);
        assert_eq!(update.position, Some(1));
        assert_eq!(update.delete_count, Some(2));
        assert!(!opts.merge);
    }

    #[test]
    fn test_get_result_serializes_camel_case() {
        let result = GetResult {
            item: json!(1),
            is_empty: false,
            expand: None,
            is_expand_empty: None,
        };
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            json!({"item": 1, "isEmpty": false})
        );
    }
}
