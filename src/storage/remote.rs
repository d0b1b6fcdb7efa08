//! Remote object-storage backend

use std::fmt;

use super::{BackendKind, StorageBackend};
use crate::error::Result;

/// Minimal object-store client surface used by [`RemoteBackend`].
///
/// Transport, retries and timeouts belong to the implementation; callers see
/// the first failure as a storage error.
pub trait ObjectStore: Send + Sync {
    /// Upload `data` under `key`, returning the service's ETag
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<String>;

    /// Download the object stored under `key`
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Keys of the objects directly under `prefix` (delimiter `/`)
    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Delete the object stored under `key`
    fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;
}

/// Writes project files as objects in a single bucket.
///
/// Node locations are `/`-separated key prefixes. Directories have no
/// existence of their own, so removing or creating them is refused.
pub struct RemoteBackend {
    bucket: String,
    store: Box<dyn ObjectStore>,
}

impl RemoteBackend {
    pub fn new(bucket: impl Into<String>, store: impl ObjectStore + 'static) -> Self {
        Self {
            bucket: bucket.into(),
            store: Box::new(store),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn key(location: &str) -> &str {
        location.trim_start_matches('/')
    }
}

impl fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl StorageBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn join(&self, prefix: &str, name: &str) -> String {
        let prefix = prefix.trim_end_matches('/');
        let name = name.trim_start_matches('/');
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", prefix, name)
        }
    }

    fn write_bytes(&self, location: &str, data: &[u8]) -> Result<String> {
        let key = Self::key(location);
        let etag = self.store.put_object(&self.bucket, key, data)?;
        log::info!(
            "Uploaded {} bytes to {}/{} (etag {})",
            data.len(),
            self.bucket,
            key,
            etag
        );
        Ok(etag)
    }

    fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
        self.store.get_object(&self.bucket, Self::key(location))
    }

    fn list_entries(&self, location: &str) -> Result<Vec<String>> {
        let prefix = self.join(Self::key(location), "");
        let prefix = if prefix.is_empty() || prefix.ends_with('/') {
            prefix
        } else {
            format!("{}/", prefix)
        };

        let names: Vec<String> = self
            .store
            .list_objects(&self.bucket, &prefix)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|name| !name.is_empty() && !name.contains('/'))
            .collect();

        log::debug!("Listed {} objects under {}/{}", names.len(), self.bucket, prefix);
        Ok(names)
    }

    fn remove_file(&self, location: &str) -> Result<()> {
        self.store.delete_object(&self.bucket, Self::key(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    #[test]
    fn test_join_uses_slashes() {
        let backend = RemoteBackend::new("bucket", MemoryObjectStore::new());

        assert_eq!(backend.join("runs/a", "b.png"), "runs/a/b.png");
        assert_eq!(backend.join("runs/a/", "/b.png"), "runs/a/b.png");
        assert_eq!(backend.join("", "b.png"), "b.png");
    }

    #[test]
    fn test_write_returns_etag_and_lists_names() {
        let store = MemoryObjectStore::new();
        let backend = RemoteBackend::new("bucket", store.clone());

        let etag = backend.write_bytes("runs/a/one.png", b"1").unwrap();
        backend.write_bytes("runs/a/two.png", b"2").unwrap();
        backend.write_bytes("runs/a/deeper/three.png", b"3").unwrap();

        assert!(etag.starts_with('"'));
        assert_eq!(
            backend.list_entries("runs/a").unwrap(),
            vec!["one.png".to_string(), "two.png".to_string()]
        );
        assert_eq!(store.object("bucket", "runs/a/one.png"), Some(b"1".to_vec()));
    }

    #[test]
    fn test_remove_file_deletes_object() {
        let backend = RemoteBackend::new("bucket", MemoryObjectStore::new());
        backend.write_bytes("runs/a/one.png", b"1").unwrap();

        backend.remove_file("runs/a/one.png").unwrap();

        assert!(backend.list_entries("runs/a").unwrap().is_empty());
        assert!(backend.read_bytes("runs/a/one.png").is_err());
    }
}
