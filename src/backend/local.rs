//! Local filesystem storage backend.

use std::{
    fs,
    path::{Path, PathBuf},
};

use bytes::Bytes;

use super::{validate_key, StorageBackend};
use crate::error::{Error, Result};

/// Suffix of in-flight writes; such files never show up in listings.
const PARTIAL_SUFFIX: &str = ".partial";

/// A storage backend using the local filesystem.
///
/// Each key maps to a file under the root directory, with `/` separating
/// subdirectories. Writes go to a sibling `.partial` file first and are
/// renamed into place, so readers never see a half-written snapshot.
///
/// # Example
///
/// ```no_run
/// use tidyset::backend::LocalBackend;
///
/// let backend = LocalBackend::new("/var/lib/tidyset").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Creates a new local backend with the given root directory.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| Error::io(e, &root))?;
        Ok(Self { root })
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, part| path.join(part)))
    }

    /// Collects every file under `dir` as a `/`-joined key.
    fn walk(&self, dir: &Path, key_prefix: &str, out: &mut Vec<String>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| Error::io(e, dir))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(e, dir))?;
            let name = entry.file_name().to_string_lossy().to_string();
            let key = format!("{key_prefix}{name}");
            let file_type = entry.file_type().map_err(|e| Error::io(e, entry.path()))?;

            if file_type.is_dir() {
                self.walk(&entry.path(), &format!("{key}/"), out)?;
            } else if file_type.is_file() && !name.ends_with(PARTIAL_SUFFIX) {
                out.push(key);
            }
        }
        Ok(())
    }
}

impl StorageBackend for LocalBackend {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.walk(&self.root, "", &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn try_get(&self, key: &str) -> Result<Option<Bytes>> {
        let path = self.resolve_path(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(e, &path)),
        }
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.resolve_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(e, parent))?;
        }

        let mut partial = path.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);

        fs::write(&partial, &data).map_err(|e| Error::io(e, &partial))?;
        fs::rename(&partial, &path).map_err(|e| Error::io(e, &path))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(e, &path)),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.resolve_path(key)?.is_file())
    }
}
