//! Configuration discovery, loading, and mutation for named modules.
//!
//! Confscout finds a module's config file by walking the directory tree,
//! decodes it with a pluggable codec, and keeps it in a [`ConfigStore`] where
//! you can read, change, diff, and save it again.
//!
//! ```ignore
//! let mut store = ConfigStore::builder()
//!     .strategy(Strategy::Project)
//!     .build();
//!
//! store.search("myapp", None)?;
//! let port = store.integer("myapp", "server.port")?;
//! store.set("myapp", "server.port", port + 1)?;
//! store.save("myapp", None)?;
//! ```
//!
//! # Modules
//!
//! A module is a named configuration unit (`"app"`, `"carriers"`, ...). Each
//! one keeps two trees: the snapshot taken when it was loaded or last saved,
//! and the working copy that `set`, `forget`, `push` and `prepend` modify.
//! [`is_dirty()`](ConfigStore::is_dirty) compares them,
//! [`rollback()`](ConfigStore::rollback) discards the working copy and
//! [`changes()`](ConfigStore::changes) lists what differs.
//!
//! Values live in a [`ConfigTree`] (a `serde_json::Value` with insertion-ordered
//! maps) and are addressed with dotted paths: `"database.hosts.0"`.
//!
//! # Discovery
//!
//! For module `myapp`, each visited directory is probed for, in order:
//!
//! | Candidate | Notes |
//! |-----------|-------|
//! | `package.json` | the `myapp` property |
//! | `.myapprc` | JSON, or YAML if it isn't JSON |
//! | `.myapprc.{json,yaml,yml,php,ini,neon,toml,xml}` | |
//! | `.config/.myapprc[.ext]` | same list as above |
//! | `myapp.config.{php,json,neon,xml}` | |
//!
//! The first candidate that decodes to a non-empty map wins. Broken candidates
//! are skipped during a search; a direct [`load()`](ConfigStore::load) reports
//! them. The [`Strategy`] decides whether to climb:
//!
//! - **`None`** (default): only the starting directory.
//! - **`Project`**: climb until a directory containing `composer.json` or
//!   `package.json`.
//! - **`Global`**: climb to the stop directory (default: home), then try
//!   `~/.config/myapp/config.{json,yaml,yml,php,ini}`.
//!
//! Search results and loads are cached until cleared.
//!
//! # Formats
//!
//! JSON, YAML, TOML, INI and XML are built in. Any other format can be added
//! by implementing [`FormatCodec`] and registering it with
//! [`ConfigStoreBuilder::codec()`]. `php` and `neon` candidates are searched
//! but need a registered codec to be read.
//!
//! # Files
//!
//! [`combine()`](ConfigStore::combine) merges several files into one,
//! [`convert()`](ConfigStore::convert) changes a file's format, and
//! [`encrypt()`](ConfigStore::encrypt) / [`decrypt()`](ConfigStore::decrypt)
//! protect a file with AES-GCM, writing `{file}.encrypted` next to it.
//!
//! # CLI integration
//!
//! With the `clap` feature (on by default), [`ConfigArgs`] adds
//! `encrypt|decrypt|convert` subcommands to a clap app. Parsed args become a
//! [`ConfigAction`], which [`ConfigStore::handle()`] runs. Without clap, build
//! a `ConfigAction` yourself.
//!
//! # Logging
//!
//! The crate emits `tracing` events (mostly `debug` and `trace`) and never
//! installs a subscriber.

pub mod codec;
pub mod crypt;
pub mod diff;
pub mod env;
pub mod error;
pub mod merge;
pub mod search;
pub mod tree;
pub mod typed;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod flatten;
mod ops;
mod persist;
mod scalar;
mod store;

#[cfg(test)]
mod fixtures;

pub use builder::ConfigStoreBuilder;
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand, CryptArgs};
pub use codec::{CodecError, CodecRegistry, FormatCodec};
pub use crypt::{AesGcmCipher, Cipher, CipherError, DecryptOptions, EncryptOptions, Encrypted};
pub use diff::{Change, Diff};
pub use error::ConfscoutError;
pub use flatten::flatten;
pub use ops::ConfigResult;
pub use search::{SearchOptions, SearchResult, Searcher};
pub use store::ConfigStore;
pub use tree::ConfigTree;
pub use typed::Collection;
pub use types::{ConfigAction, CryptTarget, EnvStyle, Strategy};
