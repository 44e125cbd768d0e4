//! Config file discovery for one module.
//!
//! A [`Searcher`] resolves, for a module name and a starting directory, the
//! single best-matching configuration file.
//!
//! # Candidate order
//!
//! At each directory the search places are tried in declared order; the first
//! candidate that exists, decodes, and (with `ignore_empty`) is non-empty wins.
//! Candidates that fail to decode are skipped, never fatal. The default places
//! for module `m` are:
//!
//! 1. `package.json` (the `m` property, or the configured `package_prop`)
//! 2. `.mrc`, `.mrc.json`, `.mrc.yaml`, `.mrc.yml`, `.mrc.php`, `.mrc.ini`,
//!    `.mrc.neon`, `.mrc.toml`, `.mrc.xml`
//! 3. the same rc names under `.config/`
//! 4. `m.config.php`, `m.config.json`, `m.config.neon`, `m.config.xml`
//!
//! # Traversal
//!
//! After a directory is exhausted the [`Strategy`] decides whether to move to
//! the parent. An explicit `stop_dir` always ends the walk once reached, the
//! filesystem root always does. Under [`Strategy::Global`] a failed walk falls
//! back to `{home}/.config/{m}/config.{json,yaml,yml,php,ini}`.
//!
//! # Caching
//!
//! Search results (including misses) are cached per resolved start directory
//! and direct loads per absolute path. Nothing expires; call the `clear_*`
//! methods when the filesystem may have changed.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::codec::{CodecRegistry, FormatCodec, JsonCodec, YamlCodec};
use crate::error::ConfscoutError;
use crate::tree::{self, ConfigTree};
use crate::types::Strategy;

const RC_EXTENSIONS: [&str; 9] = ["", "json", "yaml", "yml", "php", "ini", "neon", "toml", "xml"];
const CONFIG_EXTENSIONS: [&str; 4] = ["php", "json", "neon", "xml"];
const GLOBAL_EXTENSIONS: [&str; 5] = ["json", "yaml", "yml", "php", "ini"];
const PROJECT_MARKERS: [&str; 2] = ["composer.json", "package.json"];

/// One loaded configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub config: ConfigTree,
    pub filepath: PathBuf,
    pub is_empty: bool,
}

impl SearchResult {
    pub fn new(config: ConfigTree, filepath: impl Into<PathBuf>) -> Self {
        let is_empty = tree::is_empty_map(&config);
        Self {
            config,
            filepath: filepath.into(),
            is_empty,
        }
    }
}

/// Post-load hook. Returning `Some` replaces the result; `None` keeps it.
pub type Transform = Arc<dyn Fn(&SearchResult) -> Option<SearchResult> + Send + Sync>;

/// Knobs shared by every searcher a store creates.
#[derive(Clone)]
pub struct SearchOptions {
    /// Candidate paths relative to each directory. `None` means the defaults.
    pub search_places: Option<Vec<String>>,
    pub strategy: Strategy,
    pub stop_dir: Option<PathBuf>,
    /// Skip candidates that decode to an empty map.
    pub ignore_empty: bool,
    pub cache: bool,
    /// Property to read from `package.json` instead of the module name.
    pub package_prop: Option<String>,
    pub transform: Option<Transform>,
    /// Overrides the user's home directory.
    pub home_dir: Option<PathBuf>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            search_places: None,
            strategy: Strategy::None,
            stop_dir: None,
            ignore_empty: true,
            cache: true,
            package_prop: None,
            transform: None,
            home_dir: None,
        }
    }
}

impl fmt::Debug for SearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchOptions")
            .field("search_places", &self.search_places)
            .field("strategy", &self.strategy)
            .field("stop_dir", &self.stop_dir)
            .field("ignore_empty", &self.ignore_empty)
            .field("cache", &self.cache)
            .field("package_prop", &self.package_prop)
            .field("transform", &self.transform.is_some())
            .field("home_dir", &self.home_dir)
            .finish()
    }
}

/// The default candidate list for `module`, in precedence order.
pub fn default_search_places(module: &str) -> Vec<String> {
    let rc: Vec<String> = RC_EXTENSIONS
        .iter()
        .map(|ext| {
            if ext.is_empty() {
                format!(".{module}rc")
            } else {
                format!(".{module}rc.{ext}")
            }
        })
        .collect();

    let mut places = vec!["package.json".to_string()];
    places.extend(rc.iter().cloned());
    places.extend(rc.iter().map(|place| format!(".config/{place}")));
    places.extend(
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| format!("{module}.config.{ext}")),
    );
    places
}

/// Resolves and caches configuration files for a single module.
pub struct Searcher {
    module_name: String,
    search_places: Vec<String>,
    options: SearchOptions,
    codecs: Arc<CodecRegistry>,
    load_cache: HashMap<PathBuf, SearchResult>,
    search_cache: HashMap<PathBuf, Option<SearchResult>>,
}

impl Searcher {
    pub fn new(module_name: &str, options: SearchOptions, codecs: Arc<CodecRegistry>) -> Self {
        let search_places = options
            .search_places
            .clone()
            .unwrap_or_else(|| default_search_places(module_name));
        Self {
            module_name: module_name.to_string(),
            search_places,
            options,
            codecs,
            load_cache: HashMap::new(),
            search_cache: HashMap::new(),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn search_places(&self) -> &[String] {
        &self.search_places
    }

    /// Walk from `start` (default: the working directory) toward the root,
    /// returning the first acceptable config file.
    pub fn search(&mut self, start: Option<&Path>) -> Result<Option<SearchResult>, ConfscoutError> {
        let start_dir = resolve_start_dir(start)?;

        if self.options.cache
            && let Some(cached) = self.search_cache.get(&start_dir)
        {
            trace!(module = %self.module_name, dir = %start_dir.display(), "search cache hit");
            return Ok(cached.clone());
        }

        let home = self.home_dir();
        let stop_dir = self.options.stop_dir.as_deref().map(normalize);

        let mut found = None;
        let mut current = start_dir.clone();
        loop {
            if let Some(result) = self.probe_directory(&current) {
                found = Some(result);
                break;
            }
            if !self.should_ascend(&current, stop_dir.as_deref(), home.as_deref()) {
                break;
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        if found.is_none()
            && self.options.strategy == Strategy::Global
            && let Some(home) = &home
        {
            found = self.probe_global(home);
        }

        match &found {
            Some(result) => debug!(
                module = %self.module_name,
                path = %result.filepath.display(),
                "config found"
            ),
            None => debug!(module = %self.module_name, dir = %start_dir.display(), "no config found"),
        }

        if self.options.cache {
            self.search_cache.insert(start_dir, found.clone());
        }
        Ok(found)
    }

    /// Load one file directly, bypassing directory search.
    ///
    /// Unlike [`search`](Self::search), decode errors propagate.
    pub fn load(&mut self, path: &Path) -> Result<SearchResult, ConfscoutError> {
        let path = std::path::absolute(path).map_err(|e| ConfscoutError::io(path, e))?;

        if self.options.cache
            && let Some(cached) = self.load_cache.get(&path)
        {
            trace!(path = %path.display(), "load cache hit");
            return Ok(cached.clone());
        }
        if !path.is_file() {
            return Err(ConfscoutError::FileNotFound(path));
        }

        let result = self.read_file(&path)?;
        if self.options.cache {
            self.load_cache.insert(path, result.clone());
        }
        Ok(result)
    }

    pub fn clear_load_cache(&mut self) {
        self.load_cache.clear();
    }

    pub fn clear_search_cache(&mut self) {
        self.search_cache.clear();
    }

    pub fn clear_caches(&mut self) {
        self.clear_load_cache();
        self.clear_search_cache();
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.options
            .home_dir
            .clone()
            .or_else(|| directories::UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf()))
            .map(|home| normalize(&home))
    }

    fn probe_directory(&self, dir: &Path) -> Option<SearchResult> {
        self.search_places
            .iter()
            .find_map(|place| self.probe(&dir.join(place)))
    }

    fn probe_global(&self, home: &Path) -> Option<SearchResult> {
        let dir = home.join(".config").join(&self.module_name);
        GLOBAL_EXTENSIONS
            .iter()
            .find_map(|ext| self.probe(&dir.join(format!("config.{ext}"))))
    }

    fn probe(&self, candidate: &Path) -> Option<SearchResult> {
        if !candidate.is_file() {
            return None;
        }
        trace!(path = %candidate.display(), "probing candidate");
        match self.read_file(candidate) {
            Ok(result) if self.options.ignore_empty && result.is_empty => {
                debug!(path = %candidate.display(), "skipping empty candidate");
                None
            }
            Ok(result) => Some(result),
            Err(err) => {
                debug!(path = %candidate.display(), error = %err, "skipping candidate");
                None
            }
        }
    }

    fn should_ascend(&self, current: &Path, stop_dir: Option<&Path>, home: Option<&Path>) -> bool {
        if stop_dir == Some(current) {
            return false;
        }
        match self.options.strategy {
            Strategy::None => false,
            Strategy::Project => !PROJECT_MARKERS
                .iter()
                .any(|marker| current.join(marker).is_file()),
            Strategy::Global => stop_dir.or(home).is_none_or(|stop| stop != current),
        }
    }

    fn read_file(&self, path: &Path) -> Result<SearchResult, ConfscoutError> {
        let bytes = std::fs::read(path).map_err(|e| ConfscoutError::io(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        let config = if file_name.ends_with("package.json") {
            self.package_property(path, &bytes)?
        } else if is_rc_name(file_name) {
            decode_rc(path, &bytes)?
        } else {
            let codec = self.codecs.for_path(path)?;
            decode_with(codec.as_ref(), path, &bytes)?
        };

        let result = SearchResult::new(config, path);
        Ok(match &self.options.transform {
            Some(transform) => transform(&result).unwrap_or(result),
            None => result,
        })
    }

    fn package_property(&self, path: &Path, bytes: &[u8]) -> Result<ConfigTree, ConfscoutError> {
        let package = decode_with(&JsonCodec, path, bytes)?;
        let property = self
            .options
            .package_prop
            .as_deref()
            .unwrap_or(self.module_name.as_str());

        match tree::get(&package, property) {
            None | Some(Value::Null) => Err(ConfscoutError::MissingPackageProperty {
                path: path.to_path_buf(),
                property: property.to_string(),
            }),
            Some(value @ (Value::Object(_) | Value::Array(_))) => Ok(value.clone()),
            Some(scalar) => {
                let mut wrapped = Map::new();
                wrapped.insert("value".to_string(), scalar.clone());
                Ok(Value::Object(wrapped))
            }
        }
    }
}

impl fmt::Debug for Searcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Searcher")
            .field("module_name", &self.module_name)
            .field("search_places", &self.search_places)
            .field("options", &self.options)
            .field("cached_loads", &self.load_cache.len())
            .field("cached_searches", &self.search_cache.len())
            .finish()
    }
}

/// Decode `bytes` with `codec`, attaching `path` to any failure.
///
/// Blank files and documents that decode to null count as an empty map.
pub(crate) fn decode_with(
    codec: &dyn FormatCodec,
    path: &Path,
    bytes: &[u8],
) -> Result<ConfigTree, ConfscoutError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(tree::empty());
    }
    match codec.decode(bytes) {
        Ok(Value::Null) => Ok(tree::empty()),
        Ok(tree) => Ok(tree),
        Err(err) => Err(ConfscoutError::LoaderParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

/// A dotfile with no further dot, like `.myapprc`.
fn is_rc_name(file_name: &str) -> bool {
    file_name
        .strip_prefix('.')
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('.'))
}

/// Extensionless rc files hold either JSON or YAML.
fn decode_rc(path: &Path, bytes: &[u8]) -> Result<ConfigTree, ConfscoutError> {
    decode_with(&JsonCodec, path, bytes).or_else(|_| decode_with(&YamlCodec, path, bytes))
}

fn resolve_start_dir(start: Option<&Path>) -> Result<PathBuf, ConfscoutError> {
    let start = match start {
        Some(path) => std::path::absolute(path).map_err(|e| ConfscoutError::io(path, e))?,
        None => std::env::current_dir().map_err(|e| ConfscoutError::io(".", e))?,
    };
    let dir = if start.is_file() {
        start.parent().map(Path::to_path_buf).unwrap_or(start)
    } else {
        start
    };
    Ok(normalize(&dir))
}

fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
