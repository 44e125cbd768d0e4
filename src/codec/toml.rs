use serde_json::{Map, Number, Value};

use super::{CodecError, FormatCodec, utf8};
use crate::tree::ConfigTree;

/// TOML via the `toml` crate.
///
/// Datetimes decode to their RFC 3339 string. TOML has no null: null map
/// entries are dropped on encode, and a null inside a list is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl FormatCodec for TomlCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ConfigTree, CodecError> {
        let table: ::toml::Table = ::toml::from_str(utf8(bytes)?).map_err(CodecError::wrap)?;
        Ok(from_toml(::toml::Value::Table(table)))
    }

    fn encode(&self, tree: &ConfigTree) -> Result<Vec<u8>, CodecError> {
        let Value::Object(map) = tree else {
            return Err(CodecError::new("TOML documents must be a table at the top level"));
        };
        let table = to_table(map)?;
        ::toml::to_string(&table)
            .map(String::into_bytes)
            .map_err(CodecError::wrap)
    }

    fn extensions(&self) -> &[&str] {
        &["toml"]
    }
}

fn from_toml(value: ::toml::Value) -> Value {
    match value {
        ::toml::Value::String(s) => Value::String(s),
        ::toml::Value::Integer(i) => Value::Number(i.into()),
        ::toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        ::toml::Value::Boolean(b) => Value::Bool(b),
        ::toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        ::toml::Value::Array(items) => Value::Array(items.into_iter().map(from_toml).collect()),
        ::toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}

fn to_table(map: &Map<String, Value>) -> Result<::toml::Table, CodecError> {
    let mut table = ::toml::Table::new();
    for (key, value) in map {
        if value.is_null() {
            continue;
        }
        table.insert(key.clone(), to_toml(value)?);
    }
    Ok(table)
}

fn to_toml(value: &Value) -> Result<::toml::Value, CodecError> {
    Ok(match value {
        Value::Null => return Err(CodecError::new("TOML cannot represent null values")),
        Value::Bool(b) => ::toml::Value::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ::toml::Value::Integer(i),
            None => ::toml::Value::Float(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => ::toml::Value::String(s.clone()),
        Value::Array(items) => {
            ::toml::Value::Array(items.iter().map(to_toml).collect::<Result<_, _>>()?)
        }
        Value::Object(map) => ::toml::Value::Table(to_table(map)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_tables_and_scalars() {
        let tree = TomlCodec
            .decode(b"port = 8080\nrate = 1.5\n[database]\nurl = \"pg://\"\n")
            .unwrap();
        assert_eq!(
            tree,
            json!({"port": 8080, "rate": 1.5, "database": {"url": "pg://"}})
        );
    }

    #[test]
    fn datetime_decodes_to_string() {
        let tree = TomlCodec.decode(b"at = 1979-05-27T07:32:00Z\n").unwrap();
        assert_eq!(tree["at"], json!("1979-05-27T07:32:00Z"));
    }

    #[test]
    fn encode_drops_null_entries() {
        let out = TomlCodec.encode(&json!({"a": 1, "b": null})).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("a = 1"));
        assert!(!text.contains('b'));
    }

    #[test]
    fn encode_rejects_scalar_root() {
        assert!(TomlCodec.encode(&json!([1, 2])).is_err());
    }

    #[test]
    fn encode_then_decode_keeps_values() {
        let tree = json!({"host": "x", "db": {"pool": 5, "hosts": ["a", "b"]}});
        let bytes = TomlCodec.encode(&tree).unwrap();
        assert_eq!(TomlCodec.decode(&bytes).unwrap(), tree);
    }
}
