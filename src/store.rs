//! The module registry.
//!
//! A [`ConfigStore`] keeps one entry per module name. Each entry holds the
//! tree as it was loaded (`original`) and the tree callers mutate
//! (`working`); the module is dirty while the two differ. `save` writes
//! `working` and makes it the new baseline, `rollback` throws it away.
//!
//! Reads (`get`, `has`, typed accessors) search for an unloaded module from
//! the working directory first. Writes (`set`, `push`, `prepend`) create an
//! empty module instead.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::builder::ConfigStoreBuilder;
use crate::codec::{CodecRegistry, extension_of};
use crate::crypt::{self, Cipher, DecryptOptions, EncryptOptions, Encrypted};
use crate::diff::{self, Diff};
use crate::env;
use crate::error::ConfscoutError;
use crate::merge::merge_trees;
use crate::persist;
use crate::search::{SearchOptions, SearchResult, Searcher, decode_with};
use crate::tree::{self, ConfigTree};
use crate::typed::{self, Collection, Mismatch};

const PACKAGE_JSON: &str = "package.json";

#[derive(Debug, Clone, PartialEq)]
struct Module {
    original: ConfigTree,
    working: ConfigTree,
    /// `None` for modules created by a write.
    source: Option<SearchResult>,
}

impl Module {
    fn loaded(result: SearchResult) -> Self {
        Self {
            original: result.config.clone(),
            working: result.config.clone(),
            source: Some(result),
        }
    }

    fn created() -> Self {
        Self {
            original: tree::empty(),
            working: tree::empty(),
            source: None,
        }
    }
}

/// Discovers, holds, mutates, and persists named configuration modules.
///
/// Not internally synchronized; wrap it in a `Mutex` to share it across threads.
pub struct ConfigStore {
    options: SearchOptions,
    codecs: Arc<CodecRegistry>,
    cipher: Arc<dyn Cipher>,
    default_cipher: String,
    env_directory_base: Option<PathBuf>,
    searchers: HashMap<String, Searcher>,
    modules: BTreeMap<String, Module>,
}

/// Module name used by [`ConfigStore::diff_files`].
const SCRATCH_MODULE: &str = "diff";

fn validate_module(name: &str) -> Result<(), ConfscoutError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(ConfscoutError::InvalidConfiguration(format!(
            "invalid module name '{name}' (expected [A-Za-z0-9_-]+)"
        )))
    }
}

impl ConfigStore {
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::new()
    }

    /// A store with every default.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub(crate) fn from_parts(
        options: SearchOptions,
        codecs: Arc<CodecRegistry>,
        cipher: Arc<dyn Cipher>,
        default_cipher: String,
        env_directory_base: Option<PathBuf>,
    ) -> Self {
        Self {
            options,
            codecs,
            cipher,
            default_cipher,
            env_directory_base,
            searchers: HashMap::new(),
            modules: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn default_cipher(&self) -> &str {
        &self.default_cipher
    }

    fn searcher(&mut self, module: &str) -> &mut Searcher {
        self.searchers
            .entry(module.to_string())
            .or_insert_with(|| Searcher::new(module, self.options.clone(), Arc::clone(&self.codecs)))
    }

    // -- Loading ------------------------------------------------------------

    /// Search for `module` starting at `start` (default: the working
    /// directory). A hit replaces any loaded state for the module.
    pub fn search(
        &mut self,
        module: &str,
        start: Option<&Path>,
    ) -> Result<Option<SearchResult>, ConfscoutError> {
        validate_module(module)?;
        let found = self.searcher(module).search(start)?;
        if let Some(result) = &found {
            self.modules
                .insert(module.to_string(), Module::loaded(result.clone()));
        }
        Ok(found)
    }

    /// Load one file as `module`. Decode errors propagate.
    pub fn load(&mut self, path: &Path, module: &str) -> Result<SearchResult, ConfscoutError> {
        validate_module(module)?;
        let result = self.searcher(module).load(path)?;
        debug!(module, path = %result.filepath.display(), "module loaded");
        self.modules
            .insert(module.to_string(), Module::loaded(result.clone()));
        Ok(result)
    }

    /// Load every matching file directly inside `dir` as one module, keyed by
    /// file stem or by the first capture group of `key_pattern`.
    ///
    /// `pattern` is a glob on the file name (default `*`). Files without a
    /// registered codec are skipped; files that fail to decode are errors.
    pub fn load_directory(
        &mut self,
        dir: &Path,
        module: &str,
        pattern: Option<&str>,
        key_pattern: Option<&str>,
    ) -> Result<SearchResult, ConfscoutError> {
        validate_module(module)?;
        if !dir.is_dir() {
            return Err(ConfscoutError::DirectoryNotFound(dir.to_path_buf()));
        }
        let pattern = glob::Pattern::new(pattern.unwrap_or("*")).map_err(|e| {
            ConfscoutError::InvalidConfiguration(format!("invalid glob pattern: {e}"))
        })?;
        let key_regex = key_pattern
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfscoutError::InvalidConfiguration(format!("invalid key pattern: {e}")))?;

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| ConfscoutError::io(dir, e))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut config = Map::new();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !pattern.matches(name) {
                continue;
            }
            if !extension_of(&path).is_some_and(|ext| self.codecs.has_extension(&ext)) {
                trace!(path = %path.display(), "no codec, skipping");
                continue;
            }
            let key = directory_key(&path, name, key_regex.as_ref());
            config.insert(key, self.decode_file(&path)?);
        }

        let result = SearchResult::new(Value::Object(config), dir);
        debug!(module, dir = %dir.display(), entries = result.config.as_object().map_or(0, Map::len), "directory loaded");
        self.modules
            .insert(module.to_string(), Module::loaded(result.clone()));
        Ok(result)
    }

    /// Decode one file by extension, without caching or transforms.
    fn decode_file(&self, path: &Path) -> Result<ConfigTree, ConfscoutError> {
        if !path.is_file() {
            return Err(ConfscoutError::FileNotFound(path.to_path_buf()));
        }
        let codec = self.codecs.for_path(path)?;
        let bytes = std::fs::read(path).map_err(|e| ConfscoutError::io(path, e))?;
        decode_with(codec.as_ref(), path, &bytes)
    }

    fn ensure_loaded(&mut self, module: &str) {
        if self.modules.contains_key(module) {
            return;
        }
        if let Err(err) = self.search(module, None) {
            debug!(module, error = %err, "lazy search failed");
        }
    }

    // -- Reading and writing ------------------------------------------------

    /// The value at `key` (empty key: the whole tree), searching for the
    /// module first if it isn't loaded.
    pub fn get(&mut self, module: &str, key: &str) -> Option<ConfigTree> {
        self.ensure_loaded(module);
        let entry = self.modules.get(module)?;
        tree::get(&entry.working, key).cloned()
    }

    /// Like [`get`](Self::get), falling back to `default` when the key (or
    /// the module) is missing.
    pub fn get_or(&mut self, module: &str, key: &str, default: impl Into<ConfigTree>) -> ConfigTree {
        self.get(module, key).unwrap_or_else(|| default.into())
    }

    /// True if `key` holds a non-null value.
    pub fn has(&mut self, module: &str, key: &str) -> bool {
        self.ensure_loaded(module);
        self.modules
            .get(module)
            .is_some_and(|entry| tree::has(&entry.working, key))
    }

    fn working_mut(&mut self, module: &str) -> Result<&mut ConfigTree, ConfscoutError> {
        validate_module(module)?;
        let entry = self
            .modules
            .entry(module.to_string())
            .or_insert_with(Module::created);
        Ok(&mut entry.working)
    }

    pub fn set(&mut self, module: &str, key: &str, value: impl Into<ConfigTree>) -> Result<(), ConfscoutError> {
        tree::set(self.working_mut(module)?, key, value.into());
        trace!(module, key, "value set");
        Ok(())
    }

    /// Remove `key`. Unknown modules and keys are ignored.
    pub fn forget(&mut self, module: &str, key: &str) {
        if let Some(entry) = self.modules.get_mut(module) {
            tree::forget(&mut entry.working, key);
        }
    }

    pub fn push(&mut self, module: &str, key: &str, value: impl Into<ConfigTree>) -> Result<(), ConfscoutError> {
        tree::push(self.working_mut(module)?, key, value.into());
        Ok(())
    }

    pub fn prepend(&mut self, module: &str, key: &str, value: impl Into<ConfigTree>) -> Result<(), ConfscoutError> {
        tree::prepend(self.working_mut(module)?, key, value.into());
        Ok(())
    }

    pub fn is_dirty(&self, module: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|entry| entry.working != entry.original)
    }

    /// Discard unsaved changes.
    pub fn rollback(&mut self, module: &str) {
        if let Some(entry) = self.modules.get_mut(module) {
            entry.working = entry.original.clone();
        }
    }

    /// Write the module to `path` (default: the file it was loaded from).
    ///
    /// The target's extension picks the codec, so saving to a different
    /// extension converts. For `package.json` only the module's property is
    /// replaced. On success the saved tree becomes the new baseline.
    pub fn save(&mut self, module: &str, path: Option<&Path>) -> Result<SearchResult, ConfscoutError> {
        let entry = self
            .modules
            .get(module)
            .ok_or_else(|| ConfscoutError::ModuleNotFound(module.to_string()))?;
        let target = match (path, &entry.source) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(source)) => source.filepath.clone(),
            (None, None) => {
                return Err(ConfscoutError::InvalidConfiguration(format!(
                    "module '{module}' has no source file; pass a path to save it"
                )));
            }
        };
        if target.is_dir() {
            return Err(ConfscoutError::InvalidConfiguration(format!(
                "cannot save module '{module}' over directory {}",
                target.display()
            )));
        }

        let working = entry.working.clone();
        let document = if is_package_json(&target) {
            let mut package = if target.is_file() {
                self.decode_file(&target)?
            } else {
                tree::empty()
            };
            let property = self.options.package_prop.as_deref().unwrap_or(module);
            tree::set(&mut package, property, working.clone());
            package
        } else {
            working.clone()
        };
        persist::write_tree(&self.codecs, &target, &document)?;

        if let Some(searcher) = self.searchers.get_mut(module) {
            searcher.clear_caches();
        }
        let result = SearchResult::new(working.clone(), &target);
        if let Some(entry) = self.modules.get_mut(module) {
            entry.original = working;
            entry.source = Some(result.clone());
        }
        debug!(module, path = %target.display(), "module saved");
        Ok(result)
    }

    // -- Files ----------------------------------------------------------------

    /// Merge `sources` in order (deep or shallow) and write the result to
    /// `dest`. Returns the merged tree.
    pub fn combine<P: AsRef<Path>>(
        &self,
        dest: &Path,
        sources: &[P],
        deep: bool,
    ) -> Result<ConfigTree, ConfscoutError> {
        if sources.is_empty() {
            return Err(ConfscoutError::InvalidConfiguration(
                "combine needs at least one source file".into(),
            ));
        }
        let mut merged = tree::empty();
        for source in sources {
            merged = merge_trees(merged, self.decode_file(source.as_ref())?, deep);
        }
        persist::write_tree(&self.codecs, dest, &merged)?;
        debug!(dest = %dest.display(), sources = sources.len(), deep, "files combined");
        Ok(merged)
    }

    /// Re-encode `source` into `dest`'s format.
    pub fn convert(&self, source: &Path, dest: &Path) -> Result<(), ConfscoutError> {
        let tree = self.decode_file(source)?;
        persist::write_tree(&self.codecs, dest, &tree)?;
        debug!(source = %source.display(), dest = %dest.display(), "file converted");
        Ok(())
    }

    /// Encode a loaded module as `extension` without touching disk.
    pub fn to_format(&self, module: &str, extension: &str) -> Result<String, ConfscoutError> {
        let entry = self
            .modules
            .get(module)
            .ok_or_else(|| ConfscoutError::ModuleNotFound(module.to_string()))?;
        let codec = self.codecs.get(extension)?;
        let encode_error = |message: String| ConfscoutError::EncodeError {
            format: extension.to_ascii_lowercase(),
            message,
        };
        let bytes = codec
            .encode(&entry.working)
            .map_err(|e| encode_error(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| encode_error(e.to_string()))
    }

    // -- Typed accessors ------------------------------------------------------

    fn typed<T>(
        &mut self,
        module: &str,
        key: &str,
        coerce: fn(&Value) -> Result<T, Mismatch>,
    ) -> Result<T, ConfscoutError> {
        let raw = self.get(module, key).unwrap_or(Value::Null);
        coerce(&raw).map_err(|mismatch| ConfscoutError::TypedAccessor {
            module: module.to_string(),
            key: key.to_string(),
            expected: mismatch.expected,
            actual: mismatch.actual,
        })
    }

    pub fn string(&mut self, module: &str, key: &str) -> Result<String, ConfscoutError> {
        self.typed(module, key, typed::to_string)
    }

    pub fn integer(&mut self, module: &str, key: &str) -> Result<i64, ConfscoutError> {
        self.typed(module, key, typed::to_integer)
    }

    pub fn float(&mut self, module: &str, key: &str) -> Result<f64, ConfscoutError> {
        self.typed(module, key, typed::to_float)
    }

    pub fn boolean(&mut self, module: &str, key: &str) -> Result<bool, ConfscoutError> {
        self.typed(module, key, typed::to_boolean)
    }

    pub fn array(&mut self, module: &str, key: &str) -> Result<ConfigTree, ConfscoutError> {
        self.typed(module, key, typed::to_array)
    }

    pub fn collection(&mut self, module: &str, key: &str) -> Result<Collection, ConfscoutError> {
        self.typed(module, key, Collection::new)
    }

    // -- Diffing --------------------------------------------------------------

    pub fn diff(original: &ConfigTree, modified: &ConfigTree) -> Diff {
        diff::diff(original, modified)
    }

    /// Diff the working trees of two modules, loading them if needed.
    pub fn diff_modules(&mut self, original: &str, modified: &str) -> Result<Diff, ConfscoutError> {
        let before = self
            .get(original, "")
            .ok_or_else(|| ConfscoutError::ModuleNotFound(original.to_string()))?;
        let after = self
            .get(modified, "")
            .ok_or_else(|| ConfscoutError::ModuleNotFound(modified.to_string()))?;
        Ok(diff::diff(&before, &after))
    }

    /// Diff two files without registering them as modules.
    ///
    /// Both files go through the normal load rules under a scratch module
    /// name, so a `package.json` is read at the configured `package_prop`.
    /// Use [`diff_files_as`](Self::diff_files_as) to name the module.
    pub fn diff_files(&self, original: &Path, modified: &Path) -> Result<Diff, ConfscoutError> {
        self.diff_files_as(SCRATCH_MODULE, original, modified)
    }

    /// Like [`diff_files`](Self::diff_files), loading both files as `module`.
    pub fn diff_files_as(
        &self,
        module: &str,
        original: &Path,
        modified: &Path,
    ) -> Result<Diff, ConfscoutError> {
        validate_module(module)?;
        let mut scratch = Searcher::new(module, self.options.clone(), Arc::clone(&self.codecs));
        let before = scratch.load(original)?;
        let after = scratch.load(modified)?;
        Ok(diff::diff(&before.config, &after.config))
    }

    /// Unsaved changes of a module.
    pub fn changes(&self, module: &str) -> Result<Diff, ConfscoutError> {
        let entry = self
            .modules
            .get(module)
            .ok_or_else(|| ConfscoutError::ModuleNotFound(module.to_string()))?;
        Ok(diff::diff(&entry.original, &entry.working))
    }

    // -- Interpolation --------------------------------------------------------

    pub fn interpolate(value: &ConfigTree) -> ConfigTree {
        env::interpolate(value)
    }

    /// [`get_or`](Self::get_or), then `${VAR}` expansion from the process environment.
    pub fn get_interpolated(&mut self, module: &str, key: &str, default: impl Into<ConfigTree>) -> ConfigTree {
        env::interpolate(&self.get_or(module, key, default))
    }

    pub fn get_interpolated_with(
        &mut self,
        module: &str,
        key: &str,
        default: impl Into<ConfigTree>,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> ConfigTree {
        env::interpolate_with(&self.get_or(module, key, default), lookup)
    }

    // -- Encryption -----------------------------------------------------------

    pub fn encrypt(&self, path: &Path, options: &EncryptOptions) -> Result<Encrypted, ConfscoutError> {
        crypt::encrypt_file(
            self.cipher.as_ref(),
            path,
            options,
            &self.default_cipher,
            self.env_directory_base.as_deref(),
        )
    }

    /// Decrypt `path` with a `base64:` (or raw) key, returning the plaintext path.
    pub fn decrypt(&self, path: &Path, key: &str, options: &DecryptOptions) -> Result<PathBuf, ConfscoutError> {
        crypt::decrypt_file(
            self.cipher.as_ref(),
            path,
            key,
            options,
            &self.default_cipher,
            self.env_directory_base.as_deref(),
        )
    }

    // -- Bookkeeping ----------------------------------------------------------

    /// Forget a module and its search caches.
    pub fn clear_cache(&mut self, module: &str) {
        self.modules.remove(module);
        self.searchers.remove(module);
    }

    pub fn clear_all(&mut self) {
        self.modules.clear();
        self.searchers.clear();
    }

    /// Names of loaded modules, sorted.
    pub fn loaded_modules(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    pub fn is_loaded(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// The record of the last load or save, if the module came from disk.
    pub fn result(&self, module: &str) -> Option<&SearchResult> {
        self.modules.get(module)?.source.as_ref()
    }

    pub fn source_path(&self, module: &str) -> Option<&Path> {
        self.result(module).map(|result| result.filepath.as_path())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("options", &self.options)
            .field("codecs", &self.codecs)
            .field("default_cipher", &self.default_cipher)
            .field("env_directory_base", &self.env_directory_base)
            .field("modules", &self.loaded_modules())
            .finish()
    }
}

fn directory_key(path: &Path, file_name: &str, key_regex: Option<&Regex>) -> String {
    key_regex
        .and_then(|re| re.captures(file_name))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_name.to_string())
        })
}

fn is_package_json(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(PACKAGE_JSON))
}
