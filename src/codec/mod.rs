//! Pluggable file format codecs.
//!
//! A [`FormatCodec`] turns bytes into a [`ConfigTree`] and back. The
//! [`CodecRegistry`] maps lowercase file extensions (no dot) to codec
//! instances; several extensions may share one codec (`yaml` and `yml`).
//!
//! Extensionless rc files (`.myapprc`) never reach the registry: the loader
//! sniffs them as JSON, then YAML.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::ConfscoutError;
use crate::tree::ConfigTree;

mod ini;
mod json;
mod toml;
mod xml;
mod yaml;

pub use self::ini::IniCodec;
pub use self::json::JsonCodec;
pub use self::toml::TomlCodec;
pub use self::xml::XmlCodec;
pub use self::yaml::YamlCodec;

/// Decode/encode contract for one configuration file format.
pub trait FormatCodec: Send + Sync {
    /// Parse raw file bytes into a tree.
    fn decode(&self, bytes: &[u8]) -> Result<ConfigTree, CodecError>;

    /// Serialize a tree into file bytes.
    fn encode(&self, tree: &ConfigTree) -> Result<Vec<u8>, CodecError>;

    /// Lowercase extensions (no leading dot) this codec handles.
    fn extensions(&self) -> &[&str];
}

/// A codec failure. The loader attaches the file path when it surfaces.
#[derive(Debug)]
pub struct CodecError(String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        CodecError(message.into())
    }

    pub(crate) fn wrap(err: impl fmt::Display) -> Self {
        CodecError(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for CodecError {}

pub(crate) fn utf8(bytes: &[u8]) -> Result<&str, CodecError> {
    std::str::from_utf8(bytes).map_err(CodecError::wrap)
}

/// Lowercased extension of `path`, or `None` for extensionless names.
///
/// Dotfiles without a second dot (`.myapprc`) have no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// Extension → codec table.
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn FormatCodec>>,
}

impl CodecRegistry {
    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// The built-in codecs: json, yaml/yml, toml, ini, xml.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register_codec(Arc::new(JsonCodec));
        registry.register_codec(Arc::new(YamlCodec));
        registry.register_codec(Arc::new(TomlCodec));
        registry.register_codec(Arc::new(IniCodec));
        registry.register_codec(Arc::new(XmlCodec));
        registry
    }

    /// Map one extension to `codec`, replacing any previous mapping.
    pub fn register(&mut self, extension: &str, codec: Arc<dyn FormatCodec>) {
        self.codecs.insert(normalize(extension), codec);
    }

    /// Map every extension the codec declares.
    pub fn register_codec(&mut self, codec: Arc<dyn FormatCodec>) {
        let extensions: Vec<String> = codec.extensions().iter().map(|e| e.to_string()).collect();
        for ext in extensions {
            self.register(&ext, Arc::clone(&codec));
        }
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.codecs.contains_key(&normalize(extension))
    }

    pub fn get(&self, extension: &str) -> Result<Arc<dyn FormatCodec>, ConfscoutError> {
        self.codecs
            .get(&normalize(extension))
            .cloned()
            .ok_or_else(|| ConfscoutError::UnsupportedExtension(extension.to_string()))
    }

    /// Resolve the codec for a file path by its extension.
    pub fn for_path(&self, path: &Path) -> Result<Arc<dyn FormatCodec>, ConfscoutError> {
        let ext = extension_of(path).unwrap_or_default();
        self.get(&ext)
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.codecs.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct UpperCodec;

    impl FormatCodec for UpperCodec {
        fn decode(&self, bytes: &[u8]) -> Result<ConfigTree, CodecError> {
            Ok(json!({"raw": utf8(bytes)?.to_uppercase()}))
        }

        fn encode(&self, tree: &ConfigTree) -> Result<Vec<u8>, CodecError> {
            Ok(tree.to_string().into_bytes())
        }

        fn extensions(&self) -> &[&str] {
            &["up"]
        }
    }

    #[test]
    fn defaults_cover_builtin_formats() {
        let registry = CodecRegistry::with_defaults();
        assert_eq!(
            registry.extensions(),
            vec!["ini", "json", "toml", "xml", "yaml", "yml"]
        );
        assert!(!registry.has_extension("neon"));
        assert!(!registry.has_extension("php"));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let registry = CodecRegistry::with_defaults();
        let err = registry.get("neon").err().unwrap();
        assert!(matches!(err, ConfscoutError::UnsupportedExtension(ext) if ext == "neon"));
    }

    #[test]
    fn custom_codec_registration() {
        let mut registry = CodecRegistry::empty();
        registry.register_codec(Arc::new(UpperCodec));
        let codec = registry.get("up").unwrap();
        assert_eq!(codec.decode(b"abc").unwrap(), json!({"raw": "ABC"}));
    }

    #[test]
    fn register_normalizes_extension() {
        let mut registry = CodecRegistry::empty();
        registry.register(".NEON", Arc::new(YamlCodec));
        assert!(registry.has_extension("neon"));
    }

    #[test]
    fn for_path_uses_lowercased_extension() {
        let registry = CodecRegistry::with_defaults();
        assert!(registry.for_path(Path::new("/etc/app/CONFIG.JSON")).is_ok());
        assert!(registry.for_path(Path::new("/etc/app/.apprc")).is_err());
    }

    #[test]
    fn dotfile_without_second_dot_has_no_extension() {
        assert_eq!(extension_of(Path::new(".myapprc")), None);
        assert_eq!(extension_of(Path::new("dir/.myapprc.yaml")), Some("yaml".into()));
        assert_eq!(extension_of(Path::new("package.json")), Some("json".into()));
    }
}
