use std::path::PathBuf;

/// How far a search may climb from its starting directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Only the starting directory is searched.
    #[default]
    None,
    /// Climb until a directory containing `composer.json` or `package.json`.
    Project,
    /// Climb until the stop directory (default: the user's home) or the
    /// filesystem root, then try `~/.config/{module}/config.*`.
    Global,
}

/// How an environment name is folded into a file path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum EnvStyle {
    /// `dir/app.json` → `dir/app.{env}.json`
    #[default]
    Suffix,
    /// `dir/app.json` → `dir/{env}/app.json`
    Directory,
}

impl std::str::FromStr for EnvStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "suffix" => Ok(EnvStyle::Suffix),
            "directory" => Ok(EnvStyle::Directory),
            other => Err(format!(
                "unknown env style '{other}' (expected 'suffix' or 'directory')"
            )),
        }
    }
}

/// Options shared by `encrypt` and `decrypt` actions on a file or directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CryptTarget {
    pub key: Option<String>,
    pub cipher: Option<String>,
    pub env: Option<String>,
    pub env_style: EnvStyle,
    pub force: bool,
    /// Walk subdirectories when the target is a directory.
    pub recursive: bool,
    /// File-name glob applied when the target is a directory.
    pub glob: Option<String>,
}

/// A file operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    Encrypt {
        target: PathBuf,
        options: CryptTarget,
        /// Delete the plaintext after encrypting.
        prune: bool,
    },
    Decrypt {
        target: PathBuf,
        options: CryptTarget,
        /// Output directory override.
        path: Option<PathBuf>,
        /// Output file name override.
        filename: Option<String>,
        /// Keep the encrypted file after decrypting.
        keep: bool,
    },
    Convert {
        source: PathBuf,
        destination: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_style_parses_case_insensitively() {
        assert_eq!("Suffix".parse::<EnvStyle>(), Ok(EnvStyle::Suffix));
        assert_eq!("directory".parse::<EnvStyle>(), Ok(EnvStyle::Directory));
        assert!("flat".parse::<EnvStyle>().is_err());
    }

    #[test]
    fn defaults() {
        assert_eq!(Strategy::default(), Strategy::None);
        assert_eq!(EnvStyle::default(), EnvStyle::Suffix);
    }
}
