//! Configuration.
//!
//! Values come from, in increasing priority: built-in defaults, a TOML file
//! (`--config`, or `tidyset.toml` in the working directory if present), and
//! `TIDYSET_*` environment variables.
//!
//! ```toml
//! [storage]
//! backend = "local"
//! root = ".tidyset"
//!
//! [thresholds]
//! high_missing_percent = 20.0
//! iqr_multiplier = 1.5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    backend::BackendConfig,
    error::{Error, Result},
    quality::Thresholds,
};

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "tidyset.toml";

/// Storage root used when none is configured.
pub const DEFAULT_ROOT: &str = ".tidyset";

/// Which storage backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Files under `root`.
    #[default]
    Local,
    /// Process memory; nothing survives the process.
    Memory,
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind.
    pub backend: BackendKind,
    /// Root directory of the local backend.
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            root: PathBuf::from(DEFAULT_ROOT),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where datasets and versions are stored.
    pub storage: StorageConfig,
    /// Suggestion, scoring and diagnosis limits.
    pub thresholds: Thresholds,
}

impl Config {
    /// Loads configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// `path` is `None` and that file exists, then applies environment
    /// overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, a file does not
    /// parse, an override is malformed or a value is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&text)
    }

    /// Parses TOML text. Missing sections and keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the text does not parse.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Applies `TIDYSET_ROOT`, `TIDYSET_BACKEND`,
    /// `TIDYSET_HIGH_MISSING_PERCENT` and `TIDYSET_IQR_MULTIPLIER` as
    /// returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for unparseable values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(root) = lookup("TIDYSET_ROOT") {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(backend) = lookup("TIDYSET_BACKEND") {
            self.storage.backend = match backend.to_ascii_lowercase().as_str() {
                "local" => BackendKind::Local,
                "memory" => BackendKind::Memory,
                other => {
                    return Err(Error::invalid_config(format!(
                        "TIDYSET_BACKEND must be local or memory, got '{other}'"
                    )))
                }
            };
        }
        if let Some(value) = lookup("TIDYSET_HIGH_MISSING_PERCENT") {
            self.thresholds.high_missing_percent = parse_env("TIDYSET_HIGH_MISSING_PERCENT", &value)?;
        }
        if let Some(value) = lookup("TIDYSET_IQR_MULTIPLIER") {
            self.thresholds.iqr_multiplier = parse_env("TIDYSET_IQR_MULTIPLIER", &value)?;
        }
        Ok(())
    }

    /// Checks every value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == BackendKind::Local && self.storage.root.as_os_str().is_empty() {
            return Err(Error::invalid_config("storage.root must not be empty"));
        }
        self.thresholds.validate()
    }

    /// The backend this configuration selects.
    pub fn backend_config(&self) -> BackendConfig {
        match self.storage.backend {
            BackendKind::Local => BackendConfig::local(&self.storage.root),
            BackendKind::Memory => BackendConfig::memory(),
        }
    }
}

fn parse_env(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::invalid_config(format!("{key} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.storage.backend, BackendKind::Local);
        assert_eq!(config.storage.root, PathBuf::from(".tidyset"));
        assert_eq!(config.thresholds, Thresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str("[thresholds]\nhigh_missing_percent = 35.0\n")
            .expect("parse");
        assert_eq!(config.thresholds.high_missing_percent, 35.0);
        assert_eq!(config.thresholds.iqr_multiplier, 1.5);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_full_toml() {
        let text = r#"
            [storage]
            backend = "memory"
            root = "/srv/data"

            [thresholds]
            iqr_multiplier = 3.0
        "#;
        let config = Config::from_toml_str(text).expect("parse");
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.backend_config(), BackendConfig::Memory);
        assert_eq!(config.thresholds.iqr_multiplier, 3.0);
    }

    #[test]
    fn test_bad_toml() {
        let err = Config::from_toml_str("[storage]\nbackend = \"s3\"\n").expect_err("bad");
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("TIDYSET_ROOT", "/tmp/ts"),
                ("TIDYSET_BACKEND", "Memory"),
                ("TIDYSET_HIGH_MISSING_PERCENT", " 10 "),
                ("TIDYSET_IQR_MULTIPLIER", "2"),
            ]))
            .expect("apply");
        assert_eq!(config.storage.root, PathBuf::from("/tmp/ts"));
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.thresholds.high_missing_percent, 10.0);
        assert_eq!(config.thresholds.iqr_multiplier, 2.0);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = Config::default();
        assert!(config
            .apply_env(env(&[("TIDYSET_IQR_MULTIPLIER", "wide")]))
            .is_err());
        assert!(config
            .apply_env(env(&[("TIDYSET_BACKEND", "ftp")]))
            .is_err());
    }

    #[test]
    fn test_validate_range() {
        let mut config = Config::default();
        config.thresholds.high_missing_percent = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[storage]\nroot = \"elsewhere\"\n").expect("write");
        let config = Config::from_file(&path).expect("load");
        assert_eq!(config.storage.root, PathBuf::from("elsewhere"));

        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
