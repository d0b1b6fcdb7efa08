//! In-process object store
//!
//! Keeps objects in memory behind the same [`ObjectStore`] trait as the S3
//! client, for tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};

use super::ObjectStore;
use crate::error::{ProjectError, Result};

type Objects = BTreeMap<(String, String), Vec<u8>>;

/// Object store backed by a shared in-memory map.
///
/// Clones share the same objects, so a test can keep a handle for inspection
/// after giving one to a [`RemoteBackend`](super::RemoteBackend).
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<Objects>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of one object, if present
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .ok()?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects across all buckets
    pub fn len(&self) -> usize {
        self.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Objects>> {
        self.objects.lock().map_err(|_| ProjectError::Storage {
            location: "memory".to_string(),
            reason: "object map poisoned".to_string(),
            source: None,
        })
    }

    fn etag(data: &[u8]) -> String {
        let digest = hex::encode(Sha256::digest(data));
        format!("\"{}\"", &digest[..32])
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<String> {
        self.lock()?
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
        Ok(Self::etag(data))
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.object(bucket, key).ok_or_else(|| ProjectError::Storage {
            location: format!("{}/{}", bucket, key),
            reason: "no such key".to_string(),
            source: None,
        })
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .filter(|key| !key[prefix.len()..].contains('/'))
            .collect())
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.lock()?
            .remove(&(bucket.to_string(), key.to_string()))
            .map(|_| ())
            .ok_or_else(|| ProjectError::Storage {
                location: format!("{}/{}", bucket, key),
                reason: "no such key".to_string(),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_is_stable() {
        let store = MemoryObjectStore::new();
        let a = store.put_object("b", "k", b"same").unwrap();
        let b = store.put_object("b", "k2", b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_list_is_not_recursive() {
        let store = MemoryObjectStore::new();
        store.put_object("b", "p/x.png", b"x").unwrap();
        store.put_object("b", "p/q/y.png", b"y").unwrap();
        store.put_object("other", "p/z.png", b"z").unwrap();

        assert_eq!(store.list_objects("b", "p/").unwrap(), vec!["p/x.png".to_string()]);
    }
}
