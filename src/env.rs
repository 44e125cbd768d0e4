use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::tree::ConfigTree;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("placeholder pattern is valid")
});

/// Replace `${NAME}` and `${NAME:-default}` in every string of `value` with
/// values from the process environment.
///
/// An unset variable without a default becomes the empty string. Numbers,
/// booleans and null pass through untouched; map keys are never rewritten.
pub fn interpolate(value: &ConfigTree) -> ConfigTree {
    interpolate_with(value, &|name| std::env::var(name).ok())
}

/// Like [`interpolate`] but resolves variables through `lookup`.
///
/// Takes a closure so tests can pass synthetic data instead of the real environment.
pub fn interpolate_with(value: &ConfigTree, lookup: &dyn Fn(&str) -> Option<String>) -> ConfigTree {
    match value {
        Value::String(s) => Value::String(interpolate_str(s, lookup)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| interpolate_with(item, lookup))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), interpolate_with(item, lookup)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Interpolate a single string.
pub fn interpolate_str(s: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    PLACEHOLDER
        .replace_all(s, |caps: &Captures| {
            let name = &caps[1];
            match (lookup(name), caps.get(2)) {
                (Some(value), _) => value,
                (None, Some(default)) => default.as_str().to_string(),
                (None, None) => String::new(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_used_when_unset() {
        let lookup = vars(&[]);
        assert_eq!(interpolate_str("${HOST:-localhost}", &lookup), "localhost");
    }

    #[test]
    fn variable_wins_over_default() {
        let lookup = vars(&[("HOST", "db1")]);
        assert_eq!(interpolate_str("${HOST:-localhost}", &lookup), "db1");
    }

    #[test]
    fn unset_without_default_is_empty() {
        let lookup = vars(&[]);
        assert_eq!(interpolate_str("pre-${MISSING}-post", &lookup), "pre--post");
    }

    #[test]
    fn multiple_placeholders_in_one_string() {
        let lookup = vars(&[("USER", "app"), ("HOST", "db")]);
        assert_eq!(
            interpolate_str("postgres://${USER}@${HOST}:${PORT:-5432}/main", &lookup),
            "postgres://app@db:5432/main"
        );
    }

    #[test]
    fn empty_default_is_allowed() {
        let lookup = vars(&[]);
        assert_eq!(interpolate_str("[${X:-}]", &lookup), "[]");
    }

    #[test]
    fn text_without_placeholders_unchanged() {
        let lookup = vars(&[("A", "1")]);
        assert_eq!(interpolate_str("plain $A {A}", &lookup), "plain $A {A}");
    }

    #[test]
    fn walks_nested_values_and_keeps_scalars() {
        let lookup = vars(&[("DB_HOST", "prod")]);
        let value = json!({
            "db": {"host": "${DB_HOST}", "port": 5432, "ssl": true, "opt": null},
            "hosts": ["${DB_HOST}", "${OTHER:-x}"],
            "${DB_HOST}": "key untouched"
        });
        let out = interpolate_with(&value, &lookup);
        assert_eq!(
            out,
            json!({
                "db": {"host": "prod", "port": 5432, "ssl": true, "opt": null},
                "hosts": ["prod", "x"],
                "${DB_HOST}": "key untouched"
            })
        );
    }
}
