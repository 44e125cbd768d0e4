//! File operations behind the CLI: encrypt, decrypt, convert.
//!
//! [`ConfigStore::handle`] runs a [`ConfigAction`] and returns a
//! [`ConfigResult`] for the caller to display. Encrypt and decrypt accept a
//! single file or a directory; directories are walked one level deep (or
//! fully with `recursive`) and filtered by a glob on the file name.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::crypt::{DecryptOptions, ENCRYPTED_SUFFIX, EncryptOptions, Encrypted};
use crate::error::ConfscoutError;
use crate::store::ConfigStore;
use crate::types::{ConfigAction, CryptTarget};

/// Result of a file operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigResult {
    /// Files written, all sharing one key.
    Encrypted { files: Vec<Encrypted> },
    /// Plaintext files written.
    Decrypted { files: Vec<PathBuf> },
    Converted { source: PathBuf, destination: PathBuf },
}

impl fmt::Display for ConfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigResult::Encrypted { files } => {
                let Some(first) = files.first() else {
                    return write!(f, "No files encrypted");
                };
                for file in files {
                    writeln!(f, "Encrypted {}", file.path.display())?;
                }
                write!(f, "Key: {}", first.key)
            }
            ConfigResult::Decrypted { files } => {
                if files.is_empty() {
                    return write!(f, "No files decrypted");
                }
                for (i, path) in files.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "Decrypted {}", path.display())?;
                }
                Ok(())
            }
            ConfigResult::Converted {
                source,
                destination,
            } => write!(f, "Converted {} -> {}", source.display(), destination.display()),
        }
    }
}

/// Files under `dir` whose names match `pattern` (default `*`), sorted.
fn collect_files(
    dir: &Path,
    recursive: bool,
    pattern: Option<&str>,
    accept: impl Fn(&str) -> bool,
) -> Result<Vec<PathBuf>, ConfscoutError> {
    let pattern = glob::Pattern::new(pattern.unwrap_or("*"))
        .map_err(|e| ConfscoutError::InvalidConfiguration(format!("invalid glob pattern: {e}")))?;
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| ConfscoutError::io(dir, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if pattern.matches(name) && accept(name) {
            files.push(entry.into_path());
        }
    }
    debug!(dir = %dir.display(), count = files.len(), "collected files");
    Ok(files)
}

fn is_encrypted(name: &str) -> bool {
    name.ends_with(ENCRYPTED_SUFFIX)
}

impl ConfigStore {
    /// Handle an action and print its result to stdout.
    pub fn handle_and_print(&self, action: &ConfigAction) -> Result<(), ConfscoutError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle a [`ConfigAction`] (encrypt / decrypt / convert).
    ///
    /// For directory targets the environment option is ignored and one key
    /// is used for every file: the supplied one, or the key generated for
    /// the first file.
    pub fn handle(&self, action: &ConfigAction) -> Result<ConfigResult, ConfscoutError> {
        match action {
            ConfigAction::Encrypt {
                target,
                options,
                prune,
            } => self.encrypt_target(target, options, *prune),
            ConfigAction::Decrypt {
                target,
                options,
                path,
                filename,
                keep,
            } => {
                let key = options.key.as_deref().ok_or_else(|| {
                    ConfscoutError::InvalidConfiguration("a key is required to decrypt".into())
                })?;
                let decrypt = DecryptOptions {
                    cipher: options.cipher.clone(),
                    prune: !keep,
                    force: options.force,
                    env: options.env.clone(),
                    env_style: options.env_style,
                    path: path.clone(),
                    filename: filename.clone(),
                };
                self.decrypt_target(target, key, options, decrypt)
            }
            ConfigAction::Convert {
                source,
                destination,
            } => {
                self.convert(source, destination)?;
                Ok(ConfigResult::Converted {
                    source: source.clone(),
                    destination: destination.clone(),
                })
            }
        }
    }

    fn encrypt_target(
        &self,
        target: &Path,
        options: &CryptTarget,
        prune: bool,
    ) -> Result<ConfigResult, ConfscoutError> {
        let mut encrypt = EncryptOptions {
            key: options.key.clone(),
            cipher: options.cipher.clone(),
            prune,
            force: options.force,
            env: options.env.clone(),
            env_style: options.env_style,
        };
        if !target.is_dir() {
            let file = self.encrypt(target, &encrypt)?;
            return Ok(ConfigResult::Encrypted { files: vec![file] });
        }

        encrypt.env = None;
        let mut files = Vec::new();
        for path in collect_files(target, options.recursive, options.glob.as_deref(), |name| {
            !is_encrypted(name)
        })? {
            let file = self.encrypt(&path, &encrypt)?;
            encrypt.key.get_or_insert_with(|| file.key.clone());
            files.push(file);
        }
        Ok(ConfigResult::Encrypted { files })
    }

    fn decrypt_target(
        &self,
        target: &Path,
        key: &str,
        options: &CryptTarget,
        mut decrypt: DecryptOptions,
    ) -> Result<ConfigResult, ConfscoutError> {
        if !target.is_dir() {
            let path = self.decrypt(target, key, &decrypt)?;
            return Ok(ConfigResult::Decrypted { files: vec![path] });
        }

        decrypt.env = None;
        let mut files = Vec::new();
        for path in collect_files(target, options.recursive, options.glob.as_deref(), is_encrypted)? {
            files.push(self.decrypt(&path, key, &decrypt)?);
        }
        Ok(ConfigResult::Decrypted { files })
    }
}
