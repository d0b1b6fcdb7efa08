//! Local filesystem backend

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{BackendKind, StorageBackend};
use crate::error::{ProjectError, Result};

/// Writes project files to the local disk.
///
/// Directories are created lazily: a write creates any missing parents
/// (mkdir -p), so nodes that never receive a file leave no trace on disk.
#[derive(Debug, Clone, Default)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }

    /// Turn a possibly relative path into an absolute one without touching
    /// the filesystem.
    pub fn absolute(path: &Path) -> Result<PathBuf> {
        std::path::absolute(path).map_err(|e| {
            ProjectError::storage(path.display().to_string(), "cannot resolve path", e)
        })
    }
}

impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn join(&self, prefix: &str, name: &str) -> String {
        Path::new(prefix).join(name).to_string_lossy().into_owned()
    }

    fn write_bytes(&self, location: &str, data: &[u8]) -> Result<String> {
        let path = Self::absolute(Path::new(location))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ProjectError::storage(parent.display().to_string(), "cannot create directory", e)
            })?;
        }

        fs::write(&path, data)
            .map_err(|e| ProjectError::storage(location, "cannot write file", e))?;

        log::info!("Wrote {} bytes to {}", data.len(), path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    fn read_bytes(&self, location: &str) -> Result<Vec<u8>> {
        fs::read(location).map_err(|e| ProjectError::storage(location, "cannot read file", e))
    }

    fn list_entries(&self, location: &str) -> Result<Vec<String>> {
        let root = Path::new(location);
        let exists = root
            .try_exists()
            .map_err(|e| ProjectError::storage(location, "cannot inspect directory", e))?;
        if !exists {
            // Not materialised yet, so logically empty
            log::debug!("{} does not exist yet, listing nothing", location);
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                ProjectError::storage(location, "cannot list directory", io::Error::from(e))
            })?;
            if entry.file_type().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        log::debug!("Listed {} files in {}", names.len(), location);
        Ok(names)
    }

    fn remove_file(&self, location: &str) -> Result<()> {
        fs::remove_file(location)
            .map_err(|e| ProjectError::storage(location, "cannot remove file", e))?;
        log::info!("Removed file {}", location);
        Ok(())
    }

    fn remove(&self, location: &str) -> Result<()> {
        // remove_dir refuses non-empty directories, which is the contract
        fs::remove_dir(location).map_err(|e| {
            let reason = match e.kind() {
                io::ErrorKind::NotFound => "directory does not exist",
                _ if Path::new(location).is_dir() => "directory is not empty",
                _ => "cannot remove directory",
            };
            ProjectError::storage(location, reason, e)
        })?;
        log::info!("Removed directory {}", location);
        Ok(())
    }

    fn create_dir(&self, location: &str) -> Result<()> {
        fs::create_dir_all(location)
            .map_err(|e| ProjectError::storage(location, "cannot create directory", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn location(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_string_lossy().into_owned()
    }

    #[test]
    fn test_write_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new();
        let target = location(&dir, "a/b/c.txt");

        let written = backend.write_bytes(&target, b"hello").unwrap();

        assert!(Path::new(&written).is_absolute());
        assert_eq!(fs::read(&written).unwrap(), b"hello");
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new();
        let target = location(&dir, "note.txt");

        backend.write_bytes(&target, b"first version").unwrap();
        backend.write_bytes(&target, b"second").unwrap();

        assert_eq!(backend.read_bytes(&target).unwrap(), b"second");
    }

    #[test]
    fn test_list_entries_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new();
        backend.write_bytes(&location(&dir, "one.png"), b"1").unwrap();
        backend.write_bytes(&location(&dir, "two.png"), b"2").unwrap();
        backend.write_bytes(&location(&dir, "nested/three.png"), b"3").unwrap();

        let mut names = backend.list_entries(&location(&dir, "")).unwrap();
        names.sort();

        assert_eq!(names, vec!["one.png".to_string(), "two.png".to_string()]);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new();

        let names = backend.list_entries(&location(&dir, "never-written")).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_list_uninspectable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new();
        let file = location(&dir, "plain.txt");
        backend.write_bytes(&file, b"x").unwrap();

        // A path through a regular file cannot be inspected, unlike a missing one
        let err = backend.list_entries(&backend.join(&file, "sub")).unwrap_err();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_remove_refuses_non_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new();
        let folder = location(&dir, "folder");
        backend.write_bytes(&backend.join(&folder, "x.txt"), b"x").unwrap();

        let err = backend.remove(&folder).unwrap_err();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
        assert!(Path::new(&folder).exists());

        backend.remove_file(&backend.join(&folder, "x.txt")).unwrap();
        backend.remove(&folder).unwrap();
        assert!(!Path::new(&folder).exists());
    }

    #[test]
    fn test_remove_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new();

        let err = backend.remove(&location(&dir, "ghost")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
