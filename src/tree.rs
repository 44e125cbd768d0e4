//! The generic configuration tree and its dot-path accessors.
//!
//! Every decoded file becomes a [`ConfigTree`]: a `serde_json::Value` with
//! insertion-ordered maps. Paths are dotted (`"database.pool.size"`); a segment
//! made only of ASCII digits addresses a list index when the node at that
//! point is a list.
//!
//! Writes are permissive: [`set`] replaces whatever stands in the way of the
//! path (a scalar becomes a map) instead of failing. Reads treat a stored
//! `null` exactly like a missing key, so [`has`] cannot tell them apart.

use serde_json::{Map, Value};

/// A decoded configuration value: null, bool, number, string, map, or list.
pub type ConfigTree = Value;

/// The map variant of a [`ConfigTree`].
pub type ConfigMap = Map<String, Value>;

/// A fresh empty map tree.
pub fn empty() -> ConfigTree {
    Value::Object(Map::new())
}

/// True if the tree is a map with no entries.
pub fn is_empty_map(tree: &ConfigTree) -> bool {
    matches!(tree, Value::Object(map) if map.is_empty())
}

fn index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(index(segment)?),
        _ => None,
    }
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match node {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => items.get_mut(index(segment)?),
        _ => None,
    }
}

/// Navigate a tree by dotted path. An empty path returns the whole tree.
pub fn get<'a>(tree: &'a ConfigTree, path: &str) -> Option<&'a ConfigTree> {
    if path.is_empty() {
        return Some(tree);
    }
    path.split('.').try_fold(tree, child)
}

/// Mutable counterpart of [`get`].
pub fn get_mut<'a>(tree: &'a mut ConfigTree, path: &str) -> Option<&'a mut ConfigTree> {
    if path.is_empty() {
        return Some(tree);
    }
    let mut current = tree;
    for segment in path.split('.') {
        current = child_mut(current, segment)?;
    }
    Some(current)
}

/// Like [`get`] but returns an owned value, falling back to `default`.
pub fn get_or(tree: &ConfigTree, path: &str, default: ConfigTree) -> ConfigTree {
    get(tree, path).cloned().unwrap_or(default)
}

/// True if the path resolves to a non-null value.
pub fn has(tree: &ConfigTree, path: &str) -> bool {
    get(tree, path).is_some_and(|v| !v.is_null())
}

/// Write `value` at `path`, creating intermediate maps as needed.
///
/// Numeric segments index into existing lists, and the index one past the end
/// appends. A larger index, like any other segment that cannot address the
/// node, replaces it with a map keyed by the segment.
pub fn set(tree: &mut ConfigTree, path: &str, value: ConfigTree) {
    if path.is_empty() {
        *tree = value;
        return;
    }
    let mut current = tree;
    for segment in path.split('.') {
        current = slot(current, segment);
    }
    *current = value;
}

fn slot<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let list_index = match &*node {
        Value::Array(items) => index(segment).filter(|&i| i <= items.len()),
        _ => None,
    };
    if list_index.is_none() && !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match (node, list_index) {
        (Value::Array(items), Some(i)) => {
            if i == items.len() {
                items.push(Value::Null);
            }
            &mut items[i]
        }
        (Value::Object(map), _) => map.entry(segment).or_insert(Value::Null),
        (other, _) => other,
    }
}

/// Remove the entry at `path`. Missing paths are a no-op.
pub fn forget(tree: &mut ConfigTree, path: &str) {
    if path.is_empty() {
        return;
    }
    let (parent, leaf) = match path.rsplit_once('.') {
        Some((parent, leaf)) => (get_mut(tree, parent), leaf),
        None => (Some(tree), path),
    };
    match parent {
        Some(Value::Object(map)) => {
            map.shift_remove(leaf);
        }
        Some(Value::Array(items)) => {
            if let Some(i) = index(leaf)
                && i < items.len()
            {
                items.remove(i);
            }
        }
        _ => {}
    }
}

/// Append `value` to the list at `path`.
///
/// A missing or null entry starts a new list; any other non-list value becomes
/// the first element.
pub fn push(tree: &mut ConfigTree, path: &str, value: ConfigTree) {
    let mut items = take_list(tree, path);
    items.push(value);
    set(tree, path, Value::Array(items));
}

/// Insert `value` at the front of the list at `path`. Coerces like [`push`].
pub fn prepend(tree: &mut ConfigTree, path: &str, value: ConfigTree) {
    let mut items = take_list(tree, path);
    items.insert(0, value);
    set(tree, path, Value::Array(items));
}

fn take_list(tree: &mut ConfigTree, path: &str) -> Vec<Value> {
    match get_mut(tree, path).map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}

/// Human-readable kind of a value, used in error messages.
pub fn kind(value: &ConfigTree) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}
