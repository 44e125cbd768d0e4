use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::{CodecRegistry, FormatCodec};
use crate::crypt::{AesGcmCipher, Cipher, DEFAULT_CIPHER};
use crate::search::{SearchOptions, SearchResult};
use crate::store::ConfigStore;
use crate::types::Strategy;

/// Builder for a [`ConfigStore`].
///
/// Every setting has a default, so `ConfigStore::builder().build()` is a
/// working store: no traversal, default search places, empty candidates
/// skipped, caching on, the built-in codecs and AES-256-GCM.
///
/// Discovery knobs ([`strategy()`](Self::strategy),
/// [`search_places()`](Self::search_places), [`stop_dir()`](Self::stop_dir),
/// ...) apply to every module the store searches.
pub struct ConfigStoreBuilder {
    options: SearchOptions,
    codecs: CodecRegistry,
    cipher: Arc<dyn Cipher>,
    default_cipher: String,
    env_directory_base: Option<PathBuf>,
}

impl ConfigStoreBuilder {
    pub(crate) fn new() -> Self {
        Self {
            options: SearchOptions::default(),
            codecs: CodecRegistry::with_defaults(),
            cipher: Arc::new(AesGcmCipher),
            default_cipher: DEFAULT_CIPHER.to_string(),
            env_directory_base: None,
        }
    }

    /// Set the traversal strategy (default: [`Strategy::None`]).
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// Stop climbing once this directory has been searched.
    pub fn stop_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.stop_dir = Some(dir.into());
        self
    }

    /// Replace the default search places entirely.
    ///
    /// Places are relative paths tried in order in every visited directory.
    pub fn search_places<I, S>(mut self, places: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.search_places = Some(places.into_iter().map(Into::into).collect());
        self
    }

    /// Skip candidates that decode to an empty map (default: `true`).
    pub fn ignore_empty(mut self, ignore: bool) -> Self {
        self.options.ignore_empty = ignore;
        self
    }

    /// Enable or disable the search and load caches (default: `true`).
    pub fn cache(mut self, enabled: bool) -> Self {
        self.options.cache = enabled;
        self
    }

    /// Read this (dotted) property from `package.json` instead of the module name.
    pub fn package_prop(mut self, prop: &str) -> Self {
        self.options.package_prop = Some(prop.to_string());
        self
    }

    /// Post-process every loaded result. Returning `None` keeps the original.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&SearchResult) -> Option<SearchResult> + Send + Sync + 'static,
    {
        self.options.transform = Some(Arc::new(transform));
        self
    }

    /// Override the home directory used by [`Strategy::Global`].
    pub fn home_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.home_dir = Some(dir.into());
        self
    }

    /// Base directory (relative to each file) for directory-style env paths.
    pub fn env_directory_base(mut self, base: impl AsRef<Path>) -> Self {
        self.env_directory_base = Some(base.as_ref().to_path_buf());
        self
    }

    /// Register or replace the codec for an extension.
    pub fn codec(mut self, extension: &str, codec: Arc<dyn FormatCodec>) -> Self {
        self.codecs.register(extension, codec);
        self
    }

    /// Replace the cipher implementation (default: [`AesGcmCipher`]).
    pub fn cipher_impl(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = cipher;
        self
    }

    /// Cipher name used when an operation doesn't name one (default: `aes-256-gcm`).
    pub fn cipher(mut self, name: &str) -> Self {
        self.default_cipher = name.to_string();
        self
    }

    pub fn build(self) -> ConfigStore {
        ConfigStore::from_parts(
            self.options,
            Arc::new(self.codecs),
            self.cipher,
            self.default_cipher,
            self.env_directory_base,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::fixtures::test::write;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let store = ConfigStore::builder().build();
        let options = store.options();
        assert_eq!(options.strategy, Strategy::None);
        assert!(options.ignore_empty);
        assert!(options.cache);
        assert!(options.search_places.is_none());
        assert!(options.stop_dir.is_none());
        assert_eq!(store.default_cipher(), "aes-256-gcm");
    }

    #[test]
    fn search_places_replace_defaults() {
        let store = ConfigStore::builder()
            .search_places(["conf/app.json", "app.yaml"])
            .build();
        assert_eq!(
            store.options().search_places.as_deref(),
            Some(&["conf/app.json".to_string(), "app.yaml".to_string()][..])
        );
    }

    #[test]
    fn discovery_knobs() {
        let store = ConfigStore::builder()
            .strategy(Strategy::Global)
            .stop_dir("/srv")
            .ignore_empty(false)
            .cache(false)
            .package_prop("config.app")
            .home_dir("/home/test")
            .cipher("aes-128-gcm")
            .build();
        let options = store.options();
        assert_eq!(options.strategy, Strategy::Global);
        assert_eq!(options.stop_dir.as_deref(), Some(Path::new("/srv")));
        assert!(!options.ignore_empty);
        assert!(!options.cache);
        assert_eq!(options.package_prop.as_deref(), Some("config.app"));
        assert_eq!(options.home_dir.as_deref(), Some(Path::new("/home/test")));
        assert_eq!(store.default_cipher(), "aes-128-gcm");
    }

    #[test]
    fn codec_registers_new_extension() {
        let store = ConfigStore::builder()
            .codec("neon", Arc::new(JsonCodec))
            .build();
        assert!(store.codecs().has_extension("neon"));
        assert!(store.codecs().has_extension("json"));
    }

    #[test]
    fn transform_applies_to_loaded_results() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "app.json", r#"{"a": 1}"#);
        let mut store = ConfigStore::builder()
            .transform(|result| {
                let mut out = result.clone();
                out.config["transformed"] = json!(true);
                Some(out)
            })
            .build();
        let result = store.load(&path, "app").unwrap();
        assert_eq!(result.config, json!({"a": 1, "transformed": true}));
        assert_eq!(store.get("app", "transformed"), Some(json!(true)));
    }
}
