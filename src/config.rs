//! User configuration, stored in `~/.versecrypt/config.toml`.
//!
//! Every field is optional. A missing file means all defaults.
//!
//! ```toml
//! corpus = "/home/me/words.txt"
//! curve = "secp256r1"
//! keygen_attempts = 3
//! peers = "/home/me/.versecrypt/peers.toml"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::corpus::{CorpusContext, FileSource, MemorySource};
use crate::crypto::{Curve, EcKeyManager, DEFAULT_KEYGEN_ATTEMPTS};

/// Name of the per-user directory under `$HOME`.
const CONFIG_DIR_NAME: &str = ".versecrypt";

/// Errors that can occur when reading or writing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found. Unable to determine home directory.")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
}

/// Settings read from `config.toml`.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Word list file. The bundled list is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<Curve>,

    /// Bounded retries for key generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keygen_attempts: Option<u32>,

    /// Peer store file. Defaults to `~/.versecrypt/peers.toml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<PathBuf>,
}

impl Config {
    /// Loads the configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads the configuration from `path`, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Path to `config.toml`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(get_config_dir()?.join("config.toml"))
    }

    pub fn curve(&self) -> Curve {
        self.curve.unwrap_or_default()
    }

    pub fn keygen_attempts(&self) -> u32 {
        self.keygen_attempts.unwrap_or(DEFAULT_KEYGEN_ATTEMPTS)
    }

    /// Configured peer store path, or the default one.
    pub fn peers_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.peers {
            Some(path) => Ok(path.clone()),
            None => Ok(get_config_dir()?.join("peers.toml")),
        }
    }

    /// An unloaded corpus context over the configured word list.
    pub fn corpus_context(&self) -> CorpusContext {
        match &self.corpus {
            Some(path) => CorpusContext::new(FileSource::new(path)),
            None => CorpusContext::new(MemorySource::bundled()),
        }
    }

    /// A key manager for the configured curve and retry bound.
    pub fn key_manager(&self) -> EcKeyManager {
        EcKeyManager::new(self.curve()).with_keygen_attempts(self.keygen_attempts())
    }
}

/// Get the versecrypt config directory (`~/.versecrypt`).
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::NoConfigDir)
}
