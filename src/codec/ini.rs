use serde_json::{Map, Value};

use super::{CodecError, FormatCodec, utf8};
use crate::scalar::{parse_scalar, scalar_text};
use crate::tree::ConfigTree;

/// INI via `rust-ini`.
///
/// Keys outside any section land at the top level; each `[section]` becomes a
/// nested map. Values are typed with [`parse_scalar`]. Encoding only accepts
/// what decoding produces: scalars at the top level or one section deep.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniCodec;

impl FormatCodec for IniCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ConfigTree, CodecError> {
        let ini = ::ini::Ini::load_from_str(utf8(bytes)?).map_err(CodecError::wrap)?;
        let mut root = Map::new();

        for (section, props) in ini.iter() {
            let entries: Map<String, Value> = props
                .iter()
                .map(|(key, value)| (key.to_string(), parse_scalar(value)))
                .collect();
            match section {
                None => root.extend(entries),
                Some(name) => match root.entry(name).or_insert_with(|| Value::Object(Map::new())) {
                    Value::Object(existing) => existing.extend(entries),
                    other => *other = Value::Object(entries),
                },
            }
        }
        Ok(Value::Object(root))
    }

    fn encode(&self, tree: &ConfigTree) -> Result<Vec<u8>, CodecError> {
        let Value::Object(root) = tree else {
            return Err(CodecError::new("INI documents must be a map at the top level"));
        };
        let mut ini = ::ini::Ini::new();

        for (key, value) in root {
            match value {
                Value::Array(_) => {
                    return Err(CodecError::new(format!(
                        "INI cannot represent the list at '{key}'"
                    )));
                }
                Value::Object(section) => {
                    for (sub_key, leaf) in section {
                        if leaf.is_object() || leaf.is_array() {
                            return Err(CodecError::new(format!(
                                "INI cannot represent the nested value at '{key}.{sub_key}'"
                            )));
                        }
                        ini.with_section(Some(key.as_str()))
                            .set(sub_key.as_str(), scalar_text(leaf));
                    }
                }
                scalar => {
                    ini.with_section(None::<String>)
                        .set(key.as_str(), scalar_text(scalar));
                }
            }
        }

        let mut out = Vec::new();
        ini.write_to(&mut out).map_err(CodecError::wrap)?;
        Ok(out)
    }

    fn extensions(&self) -> &[&str] {
        &["ini"]
    }
}
