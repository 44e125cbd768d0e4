//! Writing configuration back to disk.
//!
//! The target's extension picks the codec. Writes never create directories:
//! a missing parent is [`DirectoryNotFound`](ConfscoutError::DirectoryNotFound),
//! a read-only parent or file is [`ReadOnly`](ConfscoutError::ReadOnly).

use std::path::Path;

use tracing::debug;

use crate::codec::{CodecRegistry, extension_of};
use crate::error::ConfscoutError;
use crate::tree::ConfigTree;

/// Check that `target` can be (re)written.
pub fn ensure_writable(target: &Path) -> Result<(), ConfscoutError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir_meta = std::fs::metadata(dir)
        .ok()
        .filter(|meta| meta.is_dir())
        .ok_or_else(|| ConfscoutError::DirectoryNotFound(dir.to_path_buf()))?;
    if dir_meta.permissions().readonly() {
        return Err(ConfscoutError::ReadOnly(dir.to_path_buf()));
    }
    if let Ok(meta) = std::fs::metadata(target)
        && meta.permissions().readonly()
    {
        return Err(ConfscoutError::ReadOnly(target.to_path_buf()));
    }
    Ok(())
}

/// Encode `tree` with the codec registered for `path`'s extension.
pub fn encode_for(
    codecs: &CodecRegistry,
    path: &Path,
    tree: &ConfigTree,
) -> Result<Vec<u8>, ConfscoutError> {
    let codec = codecs.for_path(path)?;
    codec
        .encode(tree)
        .map_err(|e| ConfscoutError::EncodeError {
            format: extension_of(path).unwrap_or_default(),
            message: e.to_string(),
        })
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), ConfscoutError> {
    std::fs::write(path, bytes).map_err(|e| ConfscoutError::io(path, e))
}

/// Check, encode, write.
pub fn write_tree(
    codecs: &CodecRegistry,
    path: &Path,
    tree: &ConfigTree,
) -> Result<(), ConfscoutError> {
    ensure_writable(path)?;
    let bytes = encode_for(codecs, path, tree)?;
    write_bytes(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), "configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn write_tree_uses_extension_codec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.yaml");
        write_tree(&CodecRegistry::with_defaults(), &path, &json!({"a": 1})).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 1\n");
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("out.json");
        let err = write_tree(&CodecRegistry::with_defaults(), &path, &json!({})).unwrap_err();
        assert!(matches!(err, ConfscoutError::DirectoryNotFound(_)));
    }

    #[test]
    fn readonly_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locked.json");
        fs::write(&path, "{}").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let err = ensure_writable(&path).unwrap_err();
        assert!(matches!(err, ConfscoutError::ReadOnly(p) if p == path));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.neon");
        let err = write_tree(&CodecRegistry::with_defaults(), &path, &json!({})).unwrap_err();
        assert!(matches!(err, ConfscoutError::UnsupportedExtension(_)));
        assert!(!path.exists());
    }

    #[test]
    fn encode_failure_names_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.toml");
        let err = write_tree(&CodecRegistry::with_defaults(), &path, &json!([1])).unwrap_err();
        assert!(matches!(err, ConfscoutError::EncodeError { format, .. } if format == "toml"));
    }
}
