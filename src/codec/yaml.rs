use super::{CodecError, FormatCodec};
use crate::tree::ConfigTree;

/// YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl FormatCodec for YamlCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ConfigTree, CodecError> {
        serde_yaml::from_slice(bytes).map_err(CodecError::wrap)
    }

    fn encode(&self, tree: &ConfigTree) -> Result<Vec<u8>, CodecError> {
        serde_yaml::to_string(tree)
            .map(String::into_bytes)
            .map_err(CodecError::wrap)
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}
