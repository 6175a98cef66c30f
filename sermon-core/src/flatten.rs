//! JSON flattening.
//!
//! Turns a nested JSON document into a single-level map whose keys are the
//! `_`-joined path from the root to each leaf:
//!
//! ```
//! use serde_json::json;
//!
//! let flat = sermon_core::flatten(&json!({"evse": {"state": "idle", "amps": [16, 0]}}));
//! assert_eq!(flat["evse_state"], "idle");
//! assert_eq!(flat["evse_amps_1"], 0);
//! ```
//!
//! Empty objects and empty arrays have no leaves, so they leave no trace in
//! the output. When two paths produce the same key (`{"a_b": 1, "a": {"b": 2}}`)
//! the later leaf overwrites the earlier one.

use crate::error::Result;
use serde_json::{Map, Value};

/// Flat view of a JSON document, in traversal order.
pub type FlatMap = Map<String, Value>;

const SEPARATOR: char = '_';

/// Flatten `value` depth-first, visiting members in document order.
///
/// A scalar root is stored under the empty key.
pub fn flatten(value: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    let mut prefix = String::new();
    flatten_into(value, &mut prefix, &mut out);
    out
}

fn flatten_into(value: &Value, prefix: &mut String, out: &mut FlatMap) {
    match value {
        Value::Object(members) => {
            for (name, member) in members {
                descend(member, name, prefix, out);
            }
        }
        Value::Array(elements) => {
            for (index, element) in elements.iter().enumerate() {
                descend(element, &index.to_string(), prefix, out);
            }
        }
        scalar => {
            let key = prefix.strip_suffix(SEPARATOR).unwrap_or(prefix.as_str());
            out.insert(key.to_string(), scalar.clone());
        }
    }
}

fn descend(value: &Value, segment: &str, prefix: &mut String, out: &mut FlatMap) {
    let len = prefix.len();
    prefix.push_str(segment);
    prefix.push(SEPARATOR);
    flatten_into(value, prefix, out);
    prefix.truncate(len);
}

/// Flattened entries sorted by key, the order detail views list them in.
pub fn flatten_sorted(value: &Value) -> Vec<(String, Value)> {
    let mut entries: Vec<(String, Value)> = flatten(value).into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

/// Parse one received line as a complete JSON document.
pub fn parse_line(line: &str) -> Result<Value> {
    Ok(serde_json::from_str(line.trim())?)
}

/// Render a leaf for display: strings bare, everything else as JSON text.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn count_leaves(value: &Value) -> usize {
        match value {
            Value::Object(m) => m.values().map(count_leaves).sum(),
            Value::Array(a) => a.iter().map(count_leaves).sum(),
            _ => 1,
        }
    }

    fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
        key.split(SEPARATOR).try_fold(root, |node, segment| match node {
            Value::Object(m) => m.get(segment),
            Value::Array(a) => segment.parse::<usize>().ok().and_then(|i| a.get(i)),
            _ => None,
        })
    }

    #[test]
    fn test_nested_object() {
        let flat = flatten(&json!({"a": {"b": 1, "c": 2}}));
        assert_eq!(Value::Object(flat), json!({"a_b": 1, "a_c": 2}));
    }

    #[test]
    fn test_array_indices() {
        let flat = flatten(&json!({"a": [10, 20]}));
        assert_eq!(Value::Object(flat), json!({"a_0": 10, "a_1": 20}));
    }

    #[test]
    fn test_empty_containers_vanish() {
        assert!(flatten(&json!({"a": {}})).is_empty());
        assert!(flatten(&json!({"a": []})).is_empty());
        let flat = flatten(&json!({"a": {}, "b": [], "c": 1}));
        assert_eq!(Value::Object(flat), json!({"c": 1}));
    }

    #[test]
    fn test_scalar_kinds_preserved() {
        let flat = flatten(&json!({"x": null, "y": true, "z": "s"}));
        assert_eq!(Value::Object(flat), json!({"x": null, "y": true, "z": "s"}));
    }

    #[test]
    fn test_traversal_order() {
        let value: Value = serde_json::from_str(r#"{"z": 1, "a": {"m": 2, "b": 3}, "k": [4]}"#).unwrap();
        let keys: Vec<String> = flatten(&value).keys().cloned().collect();
        assert_eq!(keys, ["z", "a_m", "a_b", "k_0"]);
    }

    #[test]
    fn test_sorted_entries() {
        let value: Value = serde_json::from_str(r#"{"z": 1, "a": {"m": 2, "b": 3}}"#).unwrap();
        let keys: Vec<String> = flatten_sorted(&value).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["a_b", "a_m", "z"]);
    }

    #[test]
    fn test_collision_last_write_wins() {
        let value: Value = serde_json::from_str(r#"{"a_b": 1, "a": {"b": 2}}"#).unwrap();
        let flat = flatten(&value);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat["a_b"], 2);
    }

    #[test]
    fn test_scalar_root() {
        let flat = flatten(&json!(42));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[""], 42);
    }

    #[test]
    fn test_top_level_array_of_objects() {
        let flat = flatten(&json!([{"id": 1}, {"id": 2, "tags": ["x"]}]));
        assert_eq!(Value::Object(flat), json!({"0_id": 1, "1_id": 2, "1_tags_0": "x"}));
    }

    #[test]
    fn test_leaf_count_and_redescent() {
        let docs = [
            json!({"evse": {"state": "charging", "phases": [16.0, 15.5, 16.2]}, "uptime": 1234}),
            json!({"a": [[1, 2], [3, [4, 5]]], "b": {"c": {"d": {"e": null}}}}),
            json!([true, false, "x", 0]),
        ];
        for doc in &docs {
            let flat = flatten(doc);
            assert_eq!(flat.len(), count_leaves(doc));
            for (key, leaf) in &flat {
                assert_eq!(lookup(doc, key), Some(leaf), "key {key}");
            }
        }
    }

    #[test]
    fn test_parse_line() {
        let value = parse_line("{\"rssi\": -61}\r\n").unwrap();
        assert_eq!(value, json!({"rssi": -61}));
        assert!(matches!(parse_line("boot: ok"), Err(crate::Error::MalformedJson(_))));
        assert!(parse_line("").is_err());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("idle")), "idle");
        assert_eq!(display_value(&json!(16.5)), "16.5");
        assert_eq!(display_value(&json!(null)), "null");
        assert_eq!(display_value(&json!([1, 2])), "[1,2]");
    }
}
