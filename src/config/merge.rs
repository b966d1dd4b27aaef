//! Deep merge of JSON documents.
//!
//! Used to lay persisted or imported overrides over the default document, to
//! apply partial category updates, and to merge settings tiers.

use serde_json::Value;

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers and booleans are replaced entirely
/// - A null overlay keeps the base value (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use support_config::config::deep_merge;
///
/// let base = json!({"food": {"dailyGoals": {"stars": 5, "newFoods": 1}}});
/// let overlay = json!({"food": {"dailyGoals": {"stars": 10}}});
/// let merged = deep_merge(base, overlay);
/// assert_eq!(merged, json!({"food": {"dailyGoals": {"stars": 10, "newFoods": 1}}}));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged_value = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged_value);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Merge values in order, later values taking precedence.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}
