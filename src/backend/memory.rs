//! In-memory storage backend.

use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use bytes::Bytes;

use super::{validate_key, StorageBackend};
use crate::error::{Error, Result};

/// An in-memory storage backend.
///
/// Keys are kept in a sorted map behind an `RwLock`, so listings come back
/// ordered and the backend can be shared across threads. Everything is lost
/// when the backend is dropped.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use tidyset::backend::{MemoryBackend, StorageBackend};
///
/// let backend = MemoryBackend::new();
/// backend.put("raw/a.csv", Bytes::from("x\n1\n")).unwrap();
/// assert_eq!(backend.list("raw/").unwrap(), vec!["raw/a.csv"]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryBackend {
    /// Creates a new empty memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys stored.
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Returns true if no data is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Bytes>>> {
        self.data
            .read()
            .map_err(|_| Error::storage("memory backend lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Bytes>>> {
        self.data
            .write()
            .map_err(|_| Error::storage("memory backend lock poisoned"))
    }
}

impl StorageBackend for MemoryBackend {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let data = self.read()?;
        Ok(data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn try_get(&self, key: &str) -> Result<Option<Bytes>> {
        validate_key(key)?;
        Ok(self.read()?.get(key).cloned())
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        validate_key(key)?;
        self.write()?.insert(key.to_string(), data);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.write()?.remove(key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.read()?.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_put_get_overwrite() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());

        backend.put("k", Bytes::from("one")).expect("put");
        backend.put("k", Bytes::from("two")).expect("put");
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.get("k").expect("get"), Bytes::from("two"));
    }

    #[test]
    fn test_list_is_sorted_and_prefixed() {
        let backend = MemoryBackend::new();
        for key in ["versions/b.csv", "raw/x.csv", "versions/a.csv", "versionsX"] {
            backend.put(key, Bytes::new()).expect("put");
        }
        assert_eq!(
            backend.list("versions/").expect("list"),
            vec!["versions/a.csv", "versions/b.csv"]
        );
        assert_eq!(backend.list("").expect("list").len(), 4);
        assert!(backend.list("nothing/").expect("list").is_empty());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.delete("missing").is_ok());
    }

    #[test]
    fn test_rejects_bad_keys() {
        let backend = MemoryBackend::new();
        assert!(backend.put("../escape", Bytes::new()).is_err());
        assert!(backend.get("").is_err());
    }

    #[test]
    fn test_concurrent_writers() {
        let backend = Arc::new(MemoryBackend::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    backend
                        .put(&format!("k{i}"), Bytes::from(vec![i as u8]))
                        .expect("put");
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }
        assert_eq!(backend.len(), 8);
    }
}
