use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Top-level configuration (loaded from k25519.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct K25519Config {
    pub keystore: KeystoreConfig,
    pub derivation: DerivationConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Directory keygen writes `<pubkey>.keystore` files into
    pub dir: PathBuf,
    /// KDF for new keystores: "scrypt" or "pbkdf2"
    pub kdf: String,
    /// KDF cost profile: "standard" or "light"
    pub profile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    /// Path used when a command is given no explicit path
    pub default_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/.config/k25519/keystores"),
            kdf: "scrypt".into(),
            profile: "standard".into(),
        }
    }
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            default_path: "m/44'/501'/0'/0'".into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl K25519Config {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            tracing::warn!(
                "config file not found: {}  (using defaults)",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Reject values that cannot be mapped onto a KDF or log format.
    pub fn validate(&self) -> CoreResult<()> {
        if !matches!(self.keystore.kdf.as_str(), "scrypt" | "pbkdf2") {
            return Err(CoreError::Config(format!(
                "keystore.kdf must be \"scrypt\" or \"pbkdf2\", got {:?}",
                self.keystore.kdf
            )));
        }
        if !matches!(self.keystore.profile.as_str(), "standard" | "light") {
            return Err(CoreError::Config(format!(
                "keystore.profile must be \"standard\" or \"light\", got {:?}",
                self.keystore.profile
            )));
        }
        if !matches!(self.log.format.as_str(), "text" | "json") {
            return Err(CoreError::Config(format!(
                "log.format must be \"text\" or \"json\", got {:?}",
                self.log.format
            )));
        }
        if !self.derivation.default_path.starts_with('m') {
            return Err(CoreError::Config(format!(
                "derivation.default_path must start with 'm', got {:?}",
                self.derivation.default_path
            )));
        }
        Ok(())
    }

    /// Keystore directory with `~/` expanded.
    pub fn keystore_dir(&self) -> PathBuf {
        expand_tilde(&self.keystore.dir)
    }
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
