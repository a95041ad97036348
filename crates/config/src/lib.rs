#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for otumat
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/otumat/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use otumat_errors::{ConfigError, Error};
use otumat_hash::{ExclusionSet, TreeHasher, DEFAULT_EXCLUDE_PATTERNS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub hash: HashConfig,

    #[serde(default)]
    pub keys: KeyConfig,

    #[serde(default)]
    pub sidecar: SidecarConfig,
}

/// Tree hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashConfig {
    /// Path components containing any of these are skipped
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

/// Signing key locations
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct KeyConfig {
    pub private_key: Option<PathBuf>,
    pub public_key: Option<PathBuf>,
}

/// Sidecar file naming
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidecarConfig {
    #[serde(default = "default_signature_extension")]
    pub signature_extension: String,
    #[serde(default = "default_public_key_extension")]
    pub public_key_extension: String,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
        }
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            signature_extension: default_signature_extension(),
            public_key_extension: default_public_key_extension(),
        }
    }
}

// Default value functions for serde
fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDE_PATTERNS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_signature_extension() -> String {
    ".sig".to_string()
}

fn default_public_key_extension() -> String {
    ".pub".to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("otumat").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into(),
            _ => Error::io_with_path(&e, path),
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// If path is provided, loads from that file and a missing file is an
    /// error. If path is None, uses the default loading behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load(),
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable is set to an unusable value.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // OTUMAT_PRIVKEY_PATH
        if let Ok(path) = std::env::var("OTUMAT_PRIVKEY_PATH") {
            self.keys.private_key = Some(non_empty_path("OTUMAT_PRIVKEY_PATH", path)?);
        }

        // OTUMAT_PUBKEY_PATH
        if let Ok(path) = std::env::var("OTUMAT_PUBKEY_PATH") {
            self.keys.public_key = Some(non_empty_path("OTUMAT_PUBKEY_PATH", path)?);
        }

        // OTUMAT_EXCLUDE
        if let Ok(patterns) = std::env::var("OTUMAT_EXCLUDE") {
            self.hash.exclude = patterns
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(ToString::to_string)
                .collect();
        }

        Ok(())
    }

    /// Check values that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), Error> {
        for (field, ext) in [
            ("sidecar.signature_extension", &self.sidecar.signature_extension),
            ("sidecar.public_key_extension", &self.sidecar.public_key_extension),
        ] {
            if ext.len() < 2 || !ext.starts_with('.') || ext.contains(['/', '\\']) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: ext.clone(),
                }
                .into());
            }
        }

        if self.sidecar.signature_extension == self.sidecar.public_key_extension {
            return Err(ConfigError::Invalid {
                message: "signature and public key sidecars need different extensions"
                    .to_string(),
            }
            .into());
        }

        if let Some(pattern) = self.hash.exclude.iter().find(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "hash.exclude".to_string(),
                value: pattern.clone(),
            }
            .into());
        }

        Ok(())
    }

    /// Tree hasher using the configured exclusions
    #[must_use]
    pub fn tree_hasher(&self) -> TreeHasher {
        TreeHasher::new(ExclusionSet::new(self.hash.exclude.iter().cloned()))
    }

    /// Private key path with `~` expanded
    #[must_use]
    pub fn private_key_path(&self) -> Option<PathBuf> {
        self.keys.private_key.as_deref().map(expand_tilde)
    }

    /// Public key path with `~` expanded
    #[must_use]
    pub fn public_key_path(&self) -> Option<PathBuf> {
        self.keys.public_key.as_deref().map(expand_tilde)
    }
}

fn non_empty_path(var: &str, value: String) -> Result<PathBuf, Error> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: var.to_string(),
            value,
        }
        .into());
    }
    Ok(PathBuf::from(value))
}

/// Replace a leading `~` with the home directory
///
/// Paths without a leading `~`, or with `~user` forms, are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.hash.exclude, vec!["pycache".to_string()]);
        assert_eq!(config.sidecar.signature_extension, ".sig");
        assert_eq!(config.sidecar.public_key_extension, ".pub");
        assert!(config.keys.private_key.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/etc/keys/private.pem");
        assert_eq!(expand_tilde(plain), plain);

        let relative = Path::new("keys/~private.pem");
        assert_eq!(expand_tilde(relative), relative);

        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/keys/private.pem")),
                home.join("keys/private.pem")
            );
            assert_eq!(expand_tilde(Path::new("~")), home);
        }
    }

    #[test]
    fn test_validate_rejects_bad_extensions() {
        let mut config = Config::default();
        config.sidecar.signature_extension = "sig".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sidecar.public_key_extension = ".sig".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.sidecar.public_key_extension = "./pub".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_pattern() {
        let mut config = Config::default();
        config.hash.exclude.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tree_hasher_uses_exclusions() {
        let mut config = Config::default();
        config.hash.exclude = vec!["target".to_string()];
        let hasher = config.tree_hasher();
        assert!(hasher.exclusions().is_excluded("target"));
        assert!(!hasher.exclusions().is_excluded("__pycache__"));
    }
}
