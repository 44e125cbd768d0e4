use crate::tree::{ConfigMap, ConfigTree};
use serde_json::Value;

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a map for the same key, recurse.
/// Otherwise, `overlay`'s value wins (lists are replaced, never concatenated).
pub fn deep_merge(mut base: ConfigMap, overlay: ConfigMap) -> ConfigMap {
    for (key, overlay_val) in overlay {
        match (base.get_mut(&key), overlay_val) {
            (Some(Value::Object(base_map)), Value::Object(overlay_map)) => {
                let merged = deep_merge(std::mem::take(base_map), overlay_map);
                *base_map = merged;
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

/// Key-union of `base` and `overlay`; overlay values win without recursion.
pub fn shallow_merge(mut base: ConfigMap, overlay: ConfigMap) -> ConfigMap {
    for (key, overlay_val) in overlay {
        base.insert(key, overlay_val);
    }
    base
}

/// Merge two trees. Non-map inputs are replaced by the overlay outright.
pub fn merge_trees(base: ConfigTree, overlay: ConfigTree, deep: bool) -> ConfigTree {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) if deep => {
            Value::Object(deep_merge(base, overlay))
        }
        (Value::Object(base), Value::Object(overlay)) => {
            Value::Object(shallow_merge(base, overlay))
        }
        (_, overlay) => overlay,
    }
}
