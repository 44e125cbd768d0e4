use super::{CodecError, FormatCodec};
use crate::tree::ConfigTree;

/// JSON via `serde_json`. Encodes pretty-printed with a trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl FormatCodec for JsonCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ConfigTree, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::wrap)
    }

    fn encode(&self, tree: &ConfigTree) -> Result<Vec<u8>, CodecError> {
        let mut out = serde_json::to_vec_pretty(tree).map_err(CodecError::wrap)?;
        out.push(b'\n');
        Ok(out)
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}
