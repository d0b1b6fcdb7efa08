//! Storage backends
//!
//! A project tree is bound to exactly one [`StorageBackend`] when its root is
//! constructed, and every descendant shares it. Two variants exist:
//! - [`LocalBackend`]: directories and files on the local disk
//! - [`RemoteBackend`]: keys in one bucket of an object store
//!
//! Operations a backend cannot express fail with
//! [`ProjectError::UnsupportedOperation`] rather than silently succeeding.

mod local;
mod memory;
mod remote;
mod s3;

use std::fmt;

use crate::error::{ProjectError, Result};

pub use local::LocalBackend;
pub use memory::MemoryObjectStore;
pub use remote::{ObjectStore, RemoteBackend};
pub use s3::{S3Client, S3Credentials};

/// The storage medium a project tree is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Local,
    Remote,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability contract shared by every storage medium.
///
/// Locations are plain strings: absolute paths for the local disk, object
/// keys for remote stores. They are produced by [`StorageBackend::join`] and
/// never re-parsed by callers.
pub trait StorageBackend: fmt::Debug + Send + Sync {
    /// Which medium this backend writes to
    fn kind(&self) -> BackendKind;

    /// Resolve `name` underneath `prefix`
    fn join(&self, prefix: &str, name: &str) -> String;

    /// Persist `data` at `location`, returning the written path or an
    /// integrity token supplied by the remote service
    fn write_bytes(&self, location: &str, data: &[u8]) -> Result<String>;

    /// Read the full contents stored at `location`
    fn read_bytes(&self, location: &str) -> Result<Vec<u8>>;

    /// Names of the files directly under `location`, without recursion
    fn list_entries(&self, location: &str) -> Result<Vec<String>>;

    /// Delete a single file
    fn remove_file(&self, location: &str) -> Result<()>;

    /// Delete the (empty) directory at `location`
    fn remove(&self, location: &str) -> Result<()> {
        Err(self.unsupported("remove", location))
    }

    /// Materialise the directory at `location` and any missing parents
    fn create_dir(&self, location: &str) -> Result<()> {
        Err(self.unsupported("create_dir", location))
    }

    /// Build the error returned for operations this backend cannot perform
    fn unsupported(&self, operation: &'static str, location: &str) -> ProjectError {
        log::debug!("{} backend refused {} on {}", self.kind(), operation, location);
        ProjectError::UnsupportedOperation {
            operation,
            backend: self.kind().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Local.to_string(), "local");
        assert_eq!(BackendKind::Remote.to_string(), "remote");
    }

    #[test]
    fn test_remote_refuses_directory_operations() {
        let backend = RemoteBackend::new("bucket", MemoryObjectStore::new());

        for result in [backend.remove("runs/a"), backend.create_dir("runs/a")] {
            match result {
                Err(ProjectError::UnsupportedOperation { backend, .. }) => {
                    assert_eq!(backend, "remote")
                }
                other => panic!("Expected UnsupportedOperation, got: {:?}", other),
            }
        }
    }
}
