//! Flatten a [`ConfigTree`] into dotted leaf paths.
//!
//! Maps and lists are walked, never emitted themselves:
//! `{"database": {"hosts": ["a", "b"]}}` → `database.hosts.0 = "a"`, `database.hosts.1 = "b"`.
//! Empty maps and lists therefore contribute no entries.

use serde_json::{Map, Value};

use crate::tree::ConfigTree;

/// Dotted path → leaf value, in traversal order.
pub type FlatMap = Map<String, Value>;

/// Flatten a tree into one entry per leaf. A scalar root yields a single `""` entry.
pub fn flatten(tree: &ConfigTree) -> FlatMap {
    let mut out = FlatMap::new();
    walk(tree, String::new(), &mut out);
    out
}

fn dotted(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn walk(node: &Value, prefix: String, out: &mut FlatMap) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                walk(value, dotted(&prefix, key), out);
            }
        }
        Value::Array(items) => {
            for (i, value) in items.iter().enumerate() {
                walk(value, dotted(&prefix, &i.to_string()), out);
            }
        }
        leaf => {
            out.insert(prefix, leaf.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_maps_become_dotted_keys() {
        let flat = flatten(&json!({"database": {"url": "pg://", "pool": {"size": 5}}}));
        assert_eq!(flat["database.url"], json!("pg://"));
        assert_eq!(flat["database.pool.size"], json!(5));
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn lists_use_index_segments() {
        let flat = flatten(&json!({"hosts": ["a", {"name": "b"}]}));
        assert_eq!(flat["hosts.0"], json!("a"));
        assert_eq!(flat["hosts.1.name"], json!("b"));
    }

    #[test]
    fn null_is_a_leaf() {
        let flat = flatten(&json!({"a": null}));
        assert_eq!(flat["a"], Value::Null);
    }

    #[test]
    fn empty_containers_emit_nothing() {
        let flat = flatten(&json!({"a": {}, "b": []}));
        assert!(flat.is_empty());
    }

    #[test]
    fn preserves_traversal_order() {
        let flat = flatten(&json!({"z": 1, "a": {"m": 2, "b": 3}}));
        let keys: Vec<&String> = flat.keys().collect();
        assert_eq!(keys, ["z", "a.m", "a.b"]);
    }
}
