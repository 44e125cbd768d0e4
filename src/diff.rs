//! Leaf-level difference between two configuration trees.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::flatten::flatten;
use crate::tree::ConfigTree;

/// A leaf whose value differs between the two trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub from: ConfigTree,
    pub to: ConfigTree,
}

/// Result of [`diff`]: dotted leaf paths grouped by what happened to them.
/// Unchanged leaves are not listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diff {
    pub added: BTreeMap<String, ConfigTree>,
    pub removed: BTreeMap<String, ConfigTree>,
    pub changed: BTreeMap<String, Change>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compare `original` against `modified` leaf by leaf.
pub fn diff(original: &ConfigTree, modified: &ConfigTree) -> Diff {
    let before = flatten(original);
    let mut after = flatten(modified);
    let mut result = Diff::default();

    for (path, old) in before {
        match after.shift_remove(&path) {
            None => {
                result.removed.insert(path, old);
            }
            Some(new) if new != old => {
                result.changed.insert(path, Change { from: old, to: new });
            }
            Some(_) => {}
        }
    }
    result.added.extend(after);
    result
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        for (path, value) in &self.added {
            lines.push(format!("+ {path} = {value}"));
        }
        for (path, value) in &self.removed {
            lines.push(format!("- {path} = {value}"));
        }
        for (path, change) in &self.changed {
            lines.push(format!("~ {path}: {} -> {}", change.from, change.to));
        }
        write!(f, "{}", lines.join("\n"))
    }
}
