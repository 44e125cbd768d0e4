//! File encryption and decryption.
//!
//! Ciphertext files sit next to their plaintext with an `.encrypted` suffix
//! (`app.json` → `app.json.encrypted`). The payload is
//! `base64(nonce || ciphertext || tag)`. Keys are exchanged as
//! `base64:<b64>`; a key string without that prefix is used as raw bytes.

use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit, Nonce};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use tracing::{debug, info};

use crate::error::ConfscoutError;
use crate::persist;
use crate::types::EnvStyle;

pub const ENCRYPTED_SUFFIX: &str = ".encrypted";
pub const KEY_PREFIX: &str = "base64:";
pub const DEFAULT_CIPHER: &str = "aes-256-gcm";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Failure inside a [`Cipher`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherError(String);

impl CipherError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for CipherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for CipherError {}

/// Pluggable symmetric cipher.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], key: &[u8], cipher: &str) -> Result<Vec<u8>, CipherError>;
    fn decrypt(&self, ciphertext: &[u8], key: &[u8], cipher: &str) -> Result<Vec<u8>, CipherError>;
    /// Key length in bytes for `cipher`, used when generating keys.
    fn key_len(&self, cipher: &str) -> Result<usize, CipherError>;

    fn generate_key(&self, cipher: &str) -> Result<Vec<u8>, CipherError> {
        let mut key = vec![0u8; self.key_len(cipher)?];
        rand::rng().fill_bytes(&mut key);
        Ok(key)
    }
}

/// AES-GCM with a random 96-bit nonce per message.
/// Supports `aes-128-gcm` and `aes-256-gcm` (names are case-insensitive).
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    fn variant(cipher: &str) -> Result<u16, CipherError> {
        match cipher.to_ascii_lowercase().as_str() {
            "aes-128-gcm" => Ok(128),
            "aes-256-gcm" => Ok(256),
            other => Err(CipherError::new(format!("unsupported cipher '{other}'"))),
        }
    }
}

fn seal<C: Aead + KeyInit>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = C::new_from_slice(key).map_err(|_| CipherError::new("invalid key length"))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|_| CipherError::new("encryption failed"))
}

fn open<C: Aead + KeyInit>(key: &[u8], nonce: &[u8], body: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = C::new_from_slice(key).map_err(|_| CipherError::new("invalid key length"))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), body)
        .map_err(|_| CipherError::new("authentication failed (wrong key or corrupted data)"))
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &[u8], key: &[u8], cipher: &str) -> Result<Vec<u8>, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);
        let sealed = match Self::variant(cipher)? {
            128 => seal::<Aes128Gcm>(key, &nonce, plaintext)?,
            _ => seal::<Aes256Gcm>(key, &nonce, plaintext)?,
        };
        let mut payload = nonce.to_vec();
        payload.extend_from_slice(&sealed);
        Ok(STANDARD.encode(payload).into_bytes())
    }

    fn decrypt(&self, ciphertext: &[u8], key: &[u8], cipher: &str) -> Result<Vec<u8>, CipherError> {
        let variant = Self::variant(cipher)?;
        let text = std::str::from_utf8(ciphertext)
            .map_err(|_| CipherError::new("payload is not base64 text"))?;
        let payload = STANDARD
            .decode(text.trim())
            .map_err(|e| CipherError::new(format!("payload is not valid base64: {e}")))?;
        if payload.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::new("payload is too short"));
        }
        let (nonce, body) = payload.split_at(NONCE_LEN);
        match variant {
            128 => open::<Aes128Gcm>(key, nonce, body),
            _ => open::<Aes256Gcm>(key, nonce, body),
        }
    }

    fn key_len(&self, cipher: &str) -> Result<usize, CipherError> {
        Ok(match Self::variant(cipher)? {
            128 => 16,
            _ => 32,
        })
    }
}

/// Decode a key string: `base64:<b64>` or raw bytes.
pub fn parse_key(key: &str) -> Result<Vec<u8>, ConfscoutError> {
    match key.strip_prefix(KEY_PREFIX) {
        Some(encoded) => STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfscoutError::InvalidConfiguration(format!("key is not valid base64: {e}"))),
        None => Ok(key.as_bytes().to_vec()),
    }
}

pub fn format_key(key: &[u8]) -> String {
    format!("{KEY_PREFIX}{}", STANDARD.encode(key))
}

/// Fold an environment name into a plaintext path.
///
/// Suffix style inserts `.{env}` before the last extension (or appends it
/// when there is none). Directory style places the file under `{env}/`,
/// optionally below `env_base` (relative to the file's directory).
pub fn env_path(path: &Path, env: Option<&str>, style: EnvStyle, env_base: Option<&Path>) -> PathBuf {
    let Some(env) = env.filter(|e| !e.is_empty()) else {
        return path.to_path_buf();
    };
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let Some(file_name) = path.file_name() else {
        return path.to_path_buf();
    };
    match style {
        EnvStyle::Suffix => {
            let stem = path.file_stem().unwrap_or(file_name).to_string_lossy();
            match path.extension() {
                Some(ext) => dir.join(format!("{stem}.{env}.{}", ext.to_string_lossy())),
                None => dir.join(format!("{}.{env}", file_name.to_string_lossy())),
            }
        }
        EnvStyle::Directory => match env_base {
            Some(base) => dir.join(base).join(env).join(file_name),
            None => dir.join(env).join(file_name),
        },
    }
}

/// `app.json` → `app.json.encrypted`
pub fn encrypted_path(plain: &Path) -> PathBuf {
    let mut name = plain.as_os_str().to_os_string();
    name.push(ENCRYPTED_SUFFIX);
    PathBuf::from(name)
}

/// `app.json.encrypted` → `app.json`; other paths are returned unchanged.
pub fn plain_path(encrypted: &Path) -> PathBuf {
    let text = encrypted.to_string_lossy();
    match text.strip_suffix(ENCRYPTED_SUFFIX) {
        Some(plain) if !plain.is_empty() => PathBuf::from(plain),
        _ => encrypted.to_path_buf(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncryptOptions {
    /// Reuse this key instead of generating one.
    pub key: Option<String>,
    pub cipher: Option<String>,
    /// Delete the plaintext afterwards.
    pub prune: bool,
    /// Overwrite an existing `.encrypted` file.
    pub force: bool,
    pub env: Option<String>,
    pub env_style: EnvStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecryptOptions {
    pub cipher: Option<String>,
    /// Delete the encrypted file afterwards.
    pub prune: bool,
    /// Overwrite an existing plaintext file.
    pub force: bool,
    pub env: Option<String>,
    pub env_style: EnvStyle,
    /// Output directory; defaults to the encrypted file's directory.
    pub path: Option<PathBuf>,
    /// Output file name; defaults to the name without `.encrypted`.
    pub filename: Option<String>,
}

/// Outcome of encrypting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encrypted {
    pub path: PathBuf,
    /// The key in `base64:` form, whether supplied or generated.
    pub key: String,
}

pub fn encrypt_file(
    cipher: &dyn Cipher,
    path: &Path,
    options: &EncryptOptions,
    default_cipher: &str,
    env_base: Option<&Path>,
) -> Result<Encrypted, ConfscoutError> {
    let source = env_path(path, options.env.as_deref(), options.env_style, env_base);
    if !source.is_file() {
        return Err(ConfscoutError::FileNotFound(source));
    }
    let target = encrypted_path(&source);
    if target.exists() && !options.force {
        return Err(ConfscoutError::TargetExists(target));
    }
    persist::ensure_writable(&target)?;

    let cipher_name = options.cipher.as_deref().unwrap_or(default_cipher);
    let key = match &options.key {
        Some(key) => parse_key(key)?,
        None => cipher
            .generate_key(cipher_name)
            .map_err(|e| ConfscoutError::EncryptionFailed(e.to_string()))?,
    };

    let plaintext = std::fs::read(&source).map_err(|e| ConfscoutError::io(&source, e))?;
    let ciphertext = cipher
        .encrypt(&plaintext, &key, cipher_name)
        .map_err(|e| ConfscoutError::EncryptionFailed(e.to_string()))?;
    persist::write_bytes(&target, &ciphertext)?;

    if options.prune {
        std::fs::remove_file(&source).map_err(|e| ConfscoutError::io(&source, e))?;
        debug!(path = %source.display(), "plaintext pruned");
    }
    info!(path = %target.display(), cipher = cipher_name, "file encrypted");
    Ok(Encrypted {
        path: target,
        key: format_key(&key),
    })
}

/// Decrypt `path` (with or without its `.encrypted` suffix) using `key`.
/// Returns the path of the written plaintext.
pub fn decrypt_file(
    cipher: &dyn Cipher,
    path: &Path,
    key: &str,
    options: &DecryptOptions,
    default_cipher: &str,
    env_base: Option<&Path>,
) -> Result<PathBuf, ConfscoutError> {
    let plain = env_path(&plain_path(path), options.env.as_deref(), options.env_style, env_base);
    let source = encrypted_path(&plain);
    if !source.is_file() {
        return Err(ConfscoutError::FileNotFound(source));
    }

    let out_dir = match &options.path {
        Some(dir) => dir.clone(),
        None => plain.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let out_name = match &options.filename {
        Some(name) => PathBuf::from(name),
        None => plain.file_name().map(PathBuf::from).unwrap_or_default(),
    };
    let target = out_dir.join(out_name);
    if target.exists() && !options.force {
        return Err(ConfscoutError::TargetExists(target));
    }
    persist::ensure_writable(&target)?;

    let key = parse_key(key)?;
    let cipher_name = options.cipher.as_deref().unwrap_or(default_cipher);
    let ciphertext = std::fs::read(&source).map_err(|e| ConfscoutError::io(&source, e))?;
    let plaintext = cipher
        .decrypt(&ciphertext, &key, cipher_name)
        .map_err(|e| ConfscoutError::DecryptionFailed {
            path: source.clone(),
            reason: e.to_string(),
        })?;
    persist::write_bytes(&target, &plaintext)?;

    if options.prune {
        std::fs::remove_file(&source).map_err(|e| ConfscoutError::io(&source, e))?;
        debug!(path = %source.display(), "ciphertext pruned");
    }
    info!(path = %target.display(), cipher = cipher_name, "file decrypted");
    Ok(target)
}
