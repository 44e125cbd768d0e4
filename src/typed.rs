//! Strict coercions behind the typed accessors on
//! [`ConfigStore`](crate::store::ConfigStore).
//!
//! Each function either produces the requested type or a [`Mismatch`] naming
//! what was expected and what was found. The store turns a mismatch into
//! [`ConfscoutError::TypedAccessor`](crate::error::ConfscoutError::TypedAccessor).

use serde_json::Value;

use crate::tree::{self, ConfigTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: &'static str,
    pub actual: String,
}

impl Mismatch {
    fn new(expected: &'static str, actual: impl Into<String>) -> Self {
        Self {
            expected,
            actual: actual.into(),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Array(_) | Value::Object(_) => "array".into(),
        Value::String(s) => format!("string \"{s}\""),
        other => format!("{} {other}", tree::kind(other)),
    }
}

/// Strings pass through, numbers are printed, booleans become `"1"` / `""`.
pub fn to_string(value: &Value) -> Result<String, Mismatch> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("1".into()),
        Value::Bool(false) => Ok(String::new()),
        other => Err(Mismatch::new("a string", describe(other))),
    }
}

fn numeric_str(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

const OUT_OF_RANGE: &str = "integer out of range";

/// Truncate `f` to an `i64`, or `None` when it falls outside the range.
fn truncate(f: f64) -> Option<i64> {
    let t = f.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    (t >= i64::MIN as f64 && t < i64::MAX as f64).then_some(t as i64)
}

/// Integers pass through; floats and numeric strings are truncated. Values
/// outside the `i64` range fail instead of saturating.
pub fn to_integer(value: &Value) -> Result<i64, Mismatch> {
    const EXPECTED: &str = "an integer";
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.is_u64() {
                return Err(Mismatch::new(EXPECTED, OUT_OF_RANGE));
            }
            n.as_f64()
                .and_then(truncate)
                .ok_or_else(|| Mismatch::new(EXPECTED, OUT_OF_RANGE))
        }
        Value::String(s) => {
            if let Ok(i) = s.trim().parse::<i64>() {
                return Ok(i);
            }
            let f = numeric_str(s).ok_or_else(|| Mismatch::new(EXPECTED, "non-numeric string"))?;
            truncate(f).ok_or_else(|| Mismatch::new(EXPECTED, OUT_OF_RANGE))
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(Mismatch::new(EXPECTED, describe(other))),
    }
}

pub fn to_float(value: &Value) -> Result<f64, Mismatch> {
    const EXPECTED: &str = "a float";
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Mismatch::new(EXPECTED, describe(value))),
        Value::String(s) => numeric_str(s).ok_or_else(|| Mismatch::new(EXPECTED, "non-numeric string")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(Mismatch::new(EXPECTED, describe(other))),
    }
}

/// Booleans pass through. The strings `1 true on yes` / `0 false off no`
/// (any case, plus the empty string as false) and the integers 1 / 0 map to
/// true / false; anything else fails.
pub fn to_boolean(value: &Value) -> Result<bool, Mismatch> {
    const EXPECTED: &str = "a boolean";
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(Mismatch::new(EXPECTED, describe(value))),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" => Ok(true),
            "0" | "false" | "off" | "no" | "" => Ok(false),
            _ => Err(Mismatch::new(EXPECTED, describe(value))),
        },
        other => Err(Mismatch::new(EXPECTED, describe(other))),
    }
}

/// Lists and maps pass through unchanged.
pub fn to_array(value: &Value) -> Result<ConfigTree, Mismatch> {
    match value {
        Value::Array(_) | Value::Object(_) => Ok(value.clone()),
        Value::Null => Err(Mismatch::new("an array", "null")),
        _ => Err(Mismatch::new("an array", "scalar")),
    }
}

/// A read-only view over a list or map value.
///
/// Lists are addressed by index (`"0"`, `"1"`, ...), maps by key. Filtering a
/// map keeps the surviving keys; filtering a list re-indexes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection(ConfigTree);

impl Collection {
    pub fn new(value: &Value) -> Result<Self, Mismatch> {
        to_array(value).map(Self)
    }

    pub fn count(&self) -> usize {
        match &self.0 {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn values(&self) -> Vec<&ConfigTree> {
        match &self.0 {
            Value::Array(items) => items.iter().collect(),
            Value::Object(map) => map.values().collect(),
            _ => Vec::new(),
        }
    }

    pub fn keys(&self) -> Vec<String> {
        match &self.0 {
            Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Dot-path lookup relative to the collection.
    pub fn get(&self, path: &str) -> Option<&ConfigTree> {
        tree::get(&self.0, path)
    }

    pub fn has(&self, path: &str) -> bool {
        tree::has(&self.0, path)
    }

    pub fn contains(&self, value: &ConfigTree) -> bool {
        self.values().into_iter().any(|v| v == value)
    }

    pub fn first(&self) -> Option<&ConfigTree> {
        self.values().first().copied()
    }

    pub fn last(&self) -> Option<&ConfigTree> {
        self.values().last().copied()
    }

    pub fn filter(&self, mut keep: impl FnMut(&ConfigTree) -> bool) -> Collection {
        match &self.0 {
            Value::Array(items) => Collection(Value::Array(
                items.iter().filter(|v| keep(v)).cloned().collect(),
            )),
            Value::Object(map) => Collection(Value::Object(
                map.iter()
                    .filter(|(_, v)| keep(v))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            )),
            other => Collection(other.clone()),
        }
    }

    pub fn as_tree(&self) -> &ConfigTree {
        &self.0
    }

    pub fn into_inner(self) -> ConfigTree {
        self.0
    }
}

impl From<Collection> for ConfigTree {
    fn from(collection: Collection) -> Self {
        collection.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_coercions() {
        assert_eq!(to_string(&json!("x")).unwrap(), "x");
        assert_eq!(to_string(&json!(42)).unwrap(), "42");
        assert_eq!(to_string(&json!(1.5)).unwrap(), "1.5");
        assert_eq!(to_string(&json!(true)).unwrap(), "1");
        assert_eq!(to_string(&json!(false)).unwrap(), "");
        let err = to_string(&json!([1])).unwrap_err();
        assert_eq!(err.actual, "array");
        assert_eq!(to_string(&Value::Null).unwrap_err().actual, "null");
    }

    #[test]
    fn integer_coercions() {
        assert_eq!(to_integer(&json!(7)).unwrap(), 7);
        assert_eq!(to_integer(&json!(7.9)).unwrap(), 7);
        assert_eq!(to_integer(&json!("12")).unwrap(), 12);
        assert_eq!(to_integer(&json!(" 3.7 ")).unwrap(), 3);
        assert_eq!(
            to_integer(&json!("abc")).unwrap_err().actual,
            "non-numeric string"
        );
        assert!(to_integer(&json!("NaN")).is_err());
        assert!(to_integer(&Value::Null).is_err());
        assert!(to_integer(&json!({"a": 1})).is_err());
    }

    #[test]
    fn integer_out_of_range_fails() {
        assert_eq!(to_integer(&json!(i64::MAX)).unwrap(), i64::MAX);
        assert_eq!(to_integer(&json!(i64::MIN)).unwrap(), i64::MIN);
        assert_eq!(
            to_integer(&json!(18446744073709551615u64)).unwrap_err().actual,
            "integer out of range"
        );
        assert_eq!(to_integer(&json!(1e300)).unwrap_err().actual, "integer out of range");
        assert_eq!(
            to_integer(&json!("99999999999999999999")).unwrap_err().actual,
            "integer out of range"
        );
        assert_eq!(to_integer(&json!("-1e19")).unwrap_err().actual, "integer out of range");
    }

    #[test]
    fn float_coercions() {
        assert_eq!(to_float(&json!(3)).unwrap(), 3.0);
        assert_eq!(to_float(&json!("2.5")).unwrap(), 2.5);
        assert!(to_float(&json!("two")).is_err());
        assert!(to_float(&json!([])).is_err());
    }

    #[test]
    fn boolean_table() {
        for truthy in [json!(true), json!(1), json!("1"), json!("TRUE"), json!("on"), json!("Yes")] {
            assert!(to_boolean(&truthy).unwrap(), "{truthy}");
        }
        for falsy in [json!(false), json!(0), json!("0"), json!("false"), json!("OFF"), json!("no"), json!("")] {
            assert!(!to_boolean(&falsy).unwrap(), "{falsy}");
        }
        assert!(to_boolean(&json!("maybe")).is_err());
        assert!(to_boolean(&json!(2)).is_err());
        assert!(to_boolean(&Value::Null).is_err());
    }

    #[test]
    fn array_accepts_lists_and_maps_only() {
        assert_eq!(to_array(&json!([1, 2])).unwrap(), json!([1, 2]));
        assert_eq!(to_array(&json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(to_array(&json!("x")).unwrap_err().actual, "scalar");
        assert_eq!(to_array(&Value::Null).unwrap_err().actual, "null");
    }

    #[test]
    fn collection_over_map() {
        let c = Collection::new(&json!({"a": 1, "b": {"c": 2}, "d": 3})).unwrap();
        assert_eq!(c.count(), 3);
        assert_eq!(c.keys(), vec!["a", "b", "d"]);
        assert_eq!(c.get("b.c"), Some(&json!(2)));
        assert!(c.contains(&json!(3)));
        assert_eq!(c.first(), Some(&json!(1)));
        assert_eq!(c.last(), Some(&json!(3)));

        let numbers = c.filter(|v| v.is_number());
        assert_eq!(numbers.into_inner(), json!({"a": 1, "d": 3}));
    }

    #[test]
    fn collection_over_list() {
        let c = Collection::new(&json!(["x", "y", "z"])).unwrap();
        assert_eq!(c.keys(), vec!["0", "1", "2"]);
        assert_eq!(c.get("1"), Some(&json!("y")));
        let filtered = c.filter(|v| v != "y");
        assert_eq!(filtered.as_tree(), &json!(["x", "z"]));
        assert!(Collection::new(&json!(5)).is_err());
    }
}
