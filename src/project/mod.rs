//! Project tree
//!
//! A [`ProjectNode`] is a directory-like container bound to a storage
//! backend. The root is created by the caller; every other node is created
//! through [`ProjectNode::add_child`] and owned by exactly one parent, so the
//! tree can never contain cycles.
//!
//! # Layout
//! ```text
//! parent_dir/
//!   black-white-figures-2022-06-01T123456/   # root (for_run)
//!     sketches/                              # child nodes
//!       trapezoid.png
//!     animation/
//!       trapezoid00.png
//!       an.mp4
//! ```
//!
//! A node's location is `parent location + name`, fixed at construction.
//! Directories are materialised lazily by the first write underneath them;
//! [`ProjectNode::ensure_dir`] creates one eagerly.

pub mod images;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};

use crate::artefact::normalize_pixels;
use crate::blueprint::Blueprint;
use crate::error::{ProjectError, Result};
use crate::naming;
use crate::storage::{BackendKind, LocalBackend, RemoteBackend, StorageBackend};
use crate::video::{self, VideoEncoder, VideoSettings};

/// Names that would shadow a node's own attributes
pub const RESERVED_NAMES: &[&str] = &[
    "name",
    "location",
    "path",
    "backend",
    "children",
    "folders",
    "parent",
    "blueprint",
];

/// A node in a project tree
#[derive(Debug)]
pub struct ProjectNode {
    name: String,
    location: String,
    backend: Arc<dyn StorageBackend>,
    children: BTreeMap<String, ProjectNode>,
}

impl ProjectNode {
    /// Create a root node on the local disk at `parent_dir/name`.
    ///
    /// A relative `parent_dir` is resolved against the current directory.
    /// Nothing is created on disk until the first write.
    pub fn local(name: &str, parent_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_backend(
            name,
            &parent_dir.as_ref().to_string_lossy(),
            Arc::new(LocalBackend::new()),
        )
    }

    /// Create a local root node for one run, named `{name}-{timestamp}`
    pub fn for_run(name: &str, parent_dir: impl AsRef<Path>) -> Result<Self> {
        validate_name(name)?;
        Self::local(&format!("{}-{}", name, naming::format_now()), parent_dir)
    }

    /// Create a root node under the key `prefix` of a remote bucket
    pub fn remote(name: &str, prefix: &str, backend: RemoteBackend) -> Result<Self> {
        Self::with_backend(name, prefix, Arc::new(backend))
    }

    /// Create a root node on any backend.
    ///
    /// A local `prefix` is resolved against the current directory; a remote
    /// one is used verbatim as a key prefix.
    pub fn with_backend(
        name: &str,
        prefix: &str,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<Self> {
        validate_name(name)?;
        let prefix = match backend.kind() {
            BackendKind::Local => {
                let dir = if prefix.is_empty() { "." } else { prefix };
                LocalBackend::absolute(Path::new(dir))?
                    .to_string_lossy()
                    .into_owned()
            }
            BackendKind::Remote => prefix.to_string(),
        };
        let location = backend.join(&prefix, name);
        log::debug!("New {} project node at {}", backend.kind(), location);

        Ok(Self {
            name: name.to_string(),
            location,
            backend,
            children: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved path (local) or key prefix (remote) of this node
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    // ------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------

    /// Add a child folder sharing this node's backend
    pub fn add_child(&mut self, name: &str) -> Result<&mut ProjectNode> {
        validate_name(name)?;
        if RESERVED_NAMES.contains(&name) || self.children.contains_key(name) {
            return Err(ProjectError::NameConflict {
                name: name.to_string(),
            });
        }

        let child = ProjectNode::with_backend(name, &self.location, Arc::clone(&self.backend))?;
        Ok(self.children.entry(name.to_string()).or_insert(child))
    }

    /// Delete a child's backing directory and forget the child.
    ///
    /// The directory must exist and be empty; the child stays registered if
    /// the backend refuses.
    pub fn remove_child(&mut self, name: &str) -> Result<()> {
        let child = self.children.get(name).ok_or_else(|| ProjectError::NotFound {
            name: name.to_string(),
        })?;

        self.backend.remove(&child.location)?;
        self.children.remove(name);
        Ok(())
    }

    pub fn child(&self, name: &str) -> Option<&ProjectNode> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut ProjectNode> {
        self.children.get_mut(name)
    }

    /// Names of the direct children, sorted
    pub fn child_names(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    pub fn children(&self) -> impl Iterator<Item = &ProjectNode> {
        self.children.values()
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Location `file_name` would be written to, without touching storage
    pub fn file_location(&self, file_name: &str) -> String {
        self.backend.join(&self.location, file_name)
    }

    /// Create this node's directory now instead of on first write
    pub fn ensure_dir(&self) -> Result<()> {
        self.backend.create_dir(&self.location)
    }

    /// Encode `image` and write it as `file_name`.
    ///
    /// Without an explicit `format` the extension of `file_name` decides,
    /// falling back to PNG.
    pub fn save_image(
        &self,
        image: &DynamicImage,
        file_name: &str,
        format: Option<ImageFormat>,
    ) -> Result<String> {
        validate_file_name(file_name)?;
        let format = format
            .or_else(|| images::format_for(file_name))
            .unwrap_or(ImageFormat::Png);

        let bytes = images::encode(image, format)?;
        self.backend.write_bytes(&self.file_location(file_name), &bytes)
    }

    /// Write `content` as UTF-8 text, replacing any existing file
    pub fn save_text(&self, content: &str, file_name: &str) -> Result<String> {
        validate_file_name(file_name)?;
        self.backend
            .write_bytes(&self.file_location(file_name), content.as_bytes())
    }

    /// Export `blueprint` and save it as text
    pub fn save_blueprint(&self, blueprint: &dyn Blueprint, file_name: &str) -> Result<String> {
        let content = blueprint.export()?;
        self.save_text(&content, file_name)
    }

    /// Delete a single file from this node
    pub fn delete_file(&self, file_name: &str) -> Result<()> {
        validate_file_name(file_name)?;
        self.backend.remove_file(&self.file_location(file_name))
    }

    /// Full locations of the files directly in this node, in listing order
    pub fn list_file_names(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .list_entries(&self.location)?
            .iter()
            .map(|name| self.file_location(name))
            .collect())
    }

    /// Names of the image files directly in this node, in listing order
    pub fn list_images(&self) -> Result<Vec<String>> {
        Ok(self
            .backend
            .list_entries(&self.location)?
            .into_iter()
            .filter(|name| images::is_image_name(name))
            .collect())
    }

    /// Decode every image in this node.
    ///
    /// Order follows the backend listing, which is not guaranteed to be
    /// chronological. Callers that need a frame order should encode it in
    /// sortable file names and sort themselves.
    pub fn load_images(&self) -> Result<Vec<DynamicImage>> {
        let names = self.list_images()?;
        log::debug!("Loading {} images from {}", names.len(), self.location);

        names
            .iter()
            .map(|name| -> Result<DynamicImage> {
                let bytes = self.backend.read_bytes(&self.file_location(name))?;
                Ok(normalize_pixels(images::decode(&bytes, name)?))
            })
            .collect()
    }

    /// Mux the images in this node into a video saved in `target`
    /// (this node when `None`). Local backend only.
    pub fn export_as_video(
        &self,
        encoder: &dyn VideoEncoder,
        file_name: &str,
        target: Option<&ProjectNode>,
        settings: &VideoSettings,
    ) -> Result<String> {
        let target = target.unwrap_or(self);
        for node in [self, target] {
            if node.backend_kind() != BackendKind::Local {
                return Err(node.backend.unsupported("export_as_video", &node.location));
            }
        }
        validate_file_name(file_name)?;
        settings.validate()?;

        let frames = self.load_images()?;
        video::frame_dimensions(&frames, &self.location)?;

        let output = target.file_location(file_name);
        if let Some(parent) = Path::new(&output).parent() {
            target.backend.create_dir(&parent.to_string_lossy())?;
        }

        encoder.encode(&frames, Path::new(&output), settings)?;
        log::info!("Exported {} frames to {}", frames.len(), output);
        Ok(output)
    }
}

/// Node names are single, non-empty path segments
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ProjectError::invalid(format!(
            "'{}' is not a valid folder name",
            name
        )));
    }
    Ok(())
}

/// File names may contain sub-folders but must stay inside the node and
/// resolve to exactly one location
fn validate_file_name(file_name: &str) -> Result<()> {
    // `.` segments are dropped from request URLs, so they would move remote keys
    let dotted = file_name
        .split(['/', '\\'])
        .any(|segment| segment == "." || segment == "..");
    if file_name.is_empty() || file_name.starts_with(['/', '\\']) || dotted {
        return Err(ProjectError::invalid(format!(
            "'{}' is not a valid file name",
            file_name
        )));
    }
    Ok(())
}
