use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfscoutError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Module '{0}' is not loaded")]
    ModuleNotFound(String),

    #[error("No codec registered for extension '{0}'")]
    UnsupportedExtension(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse {path}: {message}")]
    LoaderParse { path: PathBuf, message: String },

    #[error("Failed to encode as {format}: {message}")]
    EncodeError { format: String, message: String },

    #[error("Property '{property}' not found in {path}")]
    MissingPackageProperty { path: PathBuf, property: String },

    #[error("Value of '{key}' in module '{module}' must be {expected}, {actual} given")]
    TypedAccessor {
        module: String,
        key: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Failed to decrypt {path}: {reason}")]
    DecryptionFailed { path: PathBuf, reason: String },

    #[error("Target already exists: {0} (use force to overwrite)")]
    TargetExists(PathBuf),

    #[error("Configuration is read-only: {0}")]
    ReadOnly(PathBuf),

    #[error("Failed to access {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfscoutError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfscoutError::IoError {
            path: path.into(),
            source,
        }
    }
}
