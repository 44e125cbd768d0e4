//! Clap adapter for confscout.
//!
//! Compiled only with the `clap` Cargo feature (on by default). It provides
//! [`ConfigArgs`] and [`ConfigSubcommand`], which you can embed into a clap
//! `#[derive(Parser)]` struct to get `encrypt|decrypt|convert` subcommands.
//!
//! The only bridge to the core is [`ConfigArgs::into_action()`], which
//! converts parsed arguments into a [`ConfigAction`](crate::ConfigAction).
//! From there everything flows through
//! [`ConfigStore::handle()`](crate::ConfigStore::handle).

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::{ConfigAction, CryptTarget, EnvStyle};

/// Clap-derived args for the file subcommand group.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     config: ConfigArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigSubcommand,
}

/// Flags shared by `encrypt` and `decrypt`.
#[derive(Debug, Clone, Args)]
pub struct CryptArgs {
    /// Key as `base64:<b64>` (or raw text). Generated when encrypting without one.
    #[arg(long)]
    pub key: Option<String>,
    /// Cipher name (e.g. aes-256-gcm, aes-128-gcm).
    #[arg(long)]
    pub cipher: Option<String>,
    /// Environment name folded into the file path.
    #[arg(long)]
    pub env: Option<String>,
    /// How the environment is folded in: suffix or directory.
    #[arg(long, value_enum, default_value_t = EnvStyle::Suffix)]
    pub env_style: EnvStyle,
    /// Overwrite existing output files.
    #[arg(long)]
    pub force: bool,
    /// Walk subdirectories when the target is a directory.
    #[arg(long)]
    pub recursive: bool,
    /// File-name glob for directory targets (default: every file).
    #[arg(long)]
    pub glob: Option<String>,
}

impl From<CryptArgs> for CryptTarget {
    fn from(args: CryptArgs) -> Self {
        CryptTarget {
            key: args.key,
            cipher: args.cipher,
            env: args.env,
            env_style: args.env_style,
            force: args.force,
            recursive: args.recursive,
            glob: args.glob,
        }
    }
}

/// Available file subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Encrypt a config file, or every file in a directory.
    Encrypt {
        /// File or directory.
        target: PathBuf,
        #[command(flatten)]
        crypt: CryptArgs,
        /// Delete the plaintext after encrypting.
        #[arg(long)]
        prune: bool,
    },
    /// Decrypt an `.encrypted` file, or every one in a directory.
    Decrypt {
        /// File or directory.
        target: PathBuf,
        #[command(flatten)]
        crypt: CryptArgs,
        /// Output directory.
        #[arg(long)]
        path: Option<PathBuf>,
        /// Output file name.
        #[arg(long)]
        filename: Option<String>,
        /// Keep the encrypted file after decrypting.
        #[arg(long)]
        keep: bool,
    },
    /// Re-encode a config file in another format (picked by extension).
    Convert {
        source: PathBuf,
        destination: PathBuf,
    },
}

impl ConfigArgs {
    /// Convert clap-parsed args into a framework-agnostic `ConfigAction`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            ConfigSubcommand::Encrypt {
                target,
                crypt,
                prune,
            } => ConfigAction::Encrypt {
                target,
                options: crypt.into(),
                prune,
            },
            ConfigSubcommand::Decrypt {
                target,
                crypt,
                path,
                filename,
                keep,
            } => ConfigAction::Decrypt {
                target,
                options: crypt.into(),
                path,
                filename,
                keep,
            },
            ConfigSubcommand::Convert {
                source,
                destination,
            } => ConfigAction::Convert {
                source,
                destination,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Wrapper so we can use `try_parse_from` on the subcommand.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> ConfigAction {
        TestCli::try_parse_from(args).unwrap().config.into_action()
    }

    #[test]
    fn parse_encrypt_defaults() {
        let action = parse(&["test", "encrypt", "config/app.json"]);
        assert_eq!(
            action,
            ConfigAction::Encrypt {
                target: PathBuf::from("config/app.json"),
                options: CryptTarget::default(),
                prune: false,
            }
        );
    }

    #[test]
    fn parse_encrypt_all_flags() {
        let action = parse(&[
            "test",
            "encrypt",
            "config",
            "--key",
            "base64:AAAA",
            "--cipher",
            "aes-128-gcm",
            "--env",
            "prod",
            "--env-style",
            "directory",
            "--prune",
            "--force",
            "--recursive",
            "--glob",
            "*.json",
        ]);
        assert_eq!(
            action,
            ConfigAction::Encrypt {
                target: PathBuf::from("config"),
                options: CryptTarget {
                    key: Some("base64:AAAA".into()),
                    cipher: Some("aes-128-gcm".into()),
                    env: Some("prod".into()),
                    env_style: EnvStyle::Directory,
                    force: true,
                    recursive: true,
                    glob: Some("*.json".into()),
                },
                prune: true,
            }
        );
    }

    #[test]
    fn parse_decrypt_with_output_overrides() {
        let action = parse(&[
            "test",
            "decrypt",
            "app.json.encrypted",
            "--key",
            "base64:AAAA",
            "--path",
            "/tmp/out",
            "--filename",
            "plain.json",
            "--keep",
        ]);
        assert_eq!(
            action,
            ConfigAction::Decrypt {
                target: PathBuf::from("app.json.encrypted"),
                options: CryptTarget {
                    key: Some("base64:AAAA".into()),
                    ..Default::default()
                },
                path: Some(PathBuf::from("/tmp/out")),
                filename: Some("plain.json".into()),
                keep: true,
            }
        );
    }

    #[test]
    fn parse_convert() {
        let action = parse(&["test", "convert", "app.yaml", "app.toml"]);
        assert_eq!(
            action,
            ConfigAction::Convert {
                source: PathBuf::from("app.yaml"),
                destination: PathBuf::from("app.toml"),
            }
        );
    }

    #[test]
    fn invalid_env_style_errors() {
        let result = TestCli::try_parse_from(["test", "encrypt", "a.json", "--env-style", "flat"]);
        assert!(result.is_err());
    }

    #[test]
    fn env_style_values_are_listed() {
        use clap::ValueEnum;
        let names: Vec<String> = EnvStyle::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(names, ["suffix", "directory"]);
    }

    #[test]
    fn invalid_subcommand_errors() {
        let result = TestCli::try_parse_from(["test", "nope"]);
        assert!(result.is_err());
    }

    #[test]
    fn convert_requires_destination() {
        let result = TestCli::try_parse_from(["test", "convert", "app.yaml"]);
        assert!(result.is_err());
    }
}
