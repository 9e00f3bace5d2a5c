//! Deep-merge utility for open-ended instance records

use serde_json::{Map, Value};

use crate::store::Record;

/// Merge `value` into `record` at the nested key path `keys`.
///
/// Intermediate keys are created (or replaced) as objects as needed. If the
/// slot at the final key already holds an object and `value` is an object,
/// the two are merged key by key; otherwise the slot is overwritten.
pub fn dict_update<S: AsRef<str>>(record: &mut Record, keys: &[S], value: Value) {
    let Some((first, rest)) = keys.split_first() else {
        return;
    };
    if rest.is_empty() {
        match record.get_mut(first.as_ref()) {
            Some(existing) => deep_merge(existing, value),
            None => {
                record.insert(first.as_ref().to_owned(), value);
            }
        }
        return;
    }
    let slot = record
        .entry(first.as_ref().to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(child) = slot {
        dict_update(child, rest, value);
    }
}

fn deep_merge(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sibling_keys_merge() {
        let mut record = Record::new();
        dict_update(&mut record, &["a"], json!({"x": 1}));
        dict_update(&mut record, &["a"], json!({"y": 2}));
        assert_eq!(Value::Object(record), json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_nested_path_creates_intermediates() {
        let mut record = Record::new();
        dict_update(&mut record, &["hashes", "sha256"], json!("abc123"));
        assert_eq!(Value::Object(record), json!({"hashes": {"sha256": "abc123"}}));
    }

    #[test]
    fn test_leaf_overwritten() {
        let mut record = Record::new();
        dict_update(&mut record, &["version"], json!("1.0"));
        dict_update(&mut record, &["version"], json!("1.1"));
        assert_eq!(record.get("version"), Some(&json!("1.1")));
    }

    #[test]
    fn test_idempotent_reapply() {
        let mut record = Record::new();
        dict_update(&mut record, &["a"], json!({"x": 1}));
        dict_update(&mut record, &["a"], json!({"x": 1}));
        assert_eq!(Value::Object(record), json!({"a": {"x": 1}}));
    }

    #[test]
    fn test_unrelated_keys_untouched() {
        let mut record = Record::new();
        record.insert("error".into(), json!("timeout"));
        dict_update(&mut record, &["a", "b"], json!(true));
        assert_eq!(
            Value::Object(record),
            json!({"error": "timeout", "a": {"b": true}})
        );
    }

    #[test]
    fn test_scalar_intermediate_replaced_by_object() {
        let mut record = Record::new();
        record.insert("a".into(), json!(5));
        dict_update(&mut record, &["a", "b"], json!(1));
        assert_eq!(Value::Object(record), json!({"a": {"b": 1}}));
    }
}
