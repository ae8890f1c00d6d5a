//! Key/value storage for uploaded datasets and their version history.
//!
//! Keys are `/`-separated relative paths such as `raw/sales.csv` or
//! `versions/sales_20240101_120000.csv`. The [`StorageBackend`] trait is the
//! only thing the version store and the workspace know about storage;
//! [`LocalBackend`] maps keys onto a directory tree and [`MemoryBackend`]
//! keeps everything in a map.

pub mod local;
pub mod memory;

use std::path::PathBuf;

use bytes::Bytes;
pub use local::LocalBackend;
pub use memory::MemoryBackend;

use crate::error::{Error, Result};

/// A key/value store for snapshot files and metadata.
pub trait StorageBackend: Send + Sync {
    /// Lists all keys starting with `prefix`, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing operation fails.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Reads the value at `key`, or `None` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key exists but cannot be read.
    fn try_get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Writes `data` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Deletes `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be deleted.
    fn delete(&self, key: &str) -> Result<()>;

    /// Checks if `key` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check fails.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Reads the value at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the key does not exist.
    fn get(&self, key: &str) -> Result<Bytes> {
        self.try_get(key)?
            .ok_or_else(|| Error::storage(format!("key not found: {key}")))
    }
}

/// Rejects keys that are empty, absolute, or escape the store with `..`.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(Error::invalid_input(format!("invalid storage key '{key}'")));
    }
    if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(Error::invalid_input(format!("invalid storage key '{key}'")));
    }
    Ok(())
}

/// Configuration for storage backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Local filesystem backend.
    Local {
        /// Root directory for storage.
        root: PathBuf,
    },
    /// In-memory backend; contents are lost when it is dropped.
    Memory,
}

impl BackendConfig {
    /// Creates a local backend configuration.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::Local { root: root.into() }
    }

    /// Creates an in-memory backend configuration.
    pub fn memory() -> Self {
        Self::Memory
    }
}

/// Creates a storage backend from configuration.
///
/// # Errors
///
/// Returns an error if the backend cannot be created.
pub fn create_backend(config: BackendConfig) -> Result<Box<dyn StorageBackend>> {
    match config {
        BackendConfig::Local { root } => Ok(Box::new(LocalBackend::new(root)?)),
        BackendConfig::Memory => Ok(Box::new(MemoryBackend::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("raw/data.csv").is_ok());
        assert!(validate_key("versions/index.json").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("raw/../../x").is_err());
        assert!(validate_key("raw//x").is_err());
        assert!(validate_key("a\\b").is_err());
    }

    #[test]
    fn test_backend_config_local() {
        let config = BackendConfig::local("/tmp/test");
        assert_eq!(
            config,
            BackendConfig::Local {
                root: PathBuf::from("/tmp/test")
            }
        );
    }

    #[test]
    fn test_create_memory_backend_operations() {
        let backend = create_backend(BackendConfig::memory()).expect("backend");

        backend
            .put("raw/a.csv", Bytes::from("x\n1\n"))
            .expect("put");
        assert_eq!(backend.get("raw/a.csv").expect("get"), Bytes::from("x\n1\n"));
        assert!(backend.exists("raw/a.csv").expect("exists"));
        assert_eq!(backend.list("raw/").expect("list"), vec!["raw/a.csv"]);

        backend.delete("raw/a.csv").expect("delete");
        assert!(!backend.exists("raw/a.csv").expect("exists"));
        assert!(backend.try_get("raw/a.csv").expect("try_get").is_none());
        assert!(matches!(
            backend.get("raw/a.csv"),
            Err(Error::Storage { .. })
        ));
    }

    #[test]
    fn test_create_local_backend_operations() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let backend = create_backend(BackendConfig::local(temp_dir.path())).expect("backend");

        backend
            .put("versions/a_1.csv", Bytes::from("content"))
            .expect("put");
        assert!(backend.exists("versions/a_1.csv").expect("exists"));
        assert!(temp_dir.path().join("versions").join("a_1.csv").is_file());
    }
}
