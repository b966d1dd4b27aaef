//! Dotted-path addressing into a JSON document, e.g. `emotional.timeouts.waitTime`.
//!
//! Segments always address object keys. Arrays are leaves: a path cannot reach
//! into one.

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Split a path into segments, rejecting empty paths and empty segments.
pub fn segments(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Err(Error::invalid("configuration path must not be empty"));
    }
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(Error::invalid(format!(
            "configuration path {:?} has an empty segment",
            path
        )));
    }
    Ok(parts)
}

/// Resolve a path. Returns `None` if any segment is missing or a non-object is
/// traversed. An empty path resolves to the whole document.
pub fn get<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(doc);
    }
    path.split('.')
        .try_fold(doc, |node, segment| node.as_object()?.get(segment))
}

/// Set the value at a path, creating intermediate objects as needed.
///
/// Returns the previous value, if any. Fails when an intermediate segment holds a
/// non-object value.
pub fn set(doc: &mut Value, path: &str, value: Value) -> Result<Option<Value>> {
    let parts = segments(path)?;
    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| Error::invalid("configuration path must not be empty"))?;

    let mut node = doc;
    for (depth, segment) in parents.iter().enumerate() {
        let map = as_object_mut(node, &parts[..depth])?;
        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    let map = as_object_mut(node, parents)?;
    Ok(map.insert(last.to_string(), value))
}

fn as_object_mut<'a>(node: &'a mut Value, at: &[&str]) -> Result<&'a mut Map<String, Value>> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => Ok(map),
        _ => Err(Error::invalid(format!(
            "{} is not an object",
            if at.is_empty() {
                "document root".to_string()
            } else {
                at.join(".")
            }
        ))),
    }
}
