//! project-util - Project folders and artefacts for generated images
//!
//! project-util organises the output of generative runs:
//! 1. Projects - a tree of named folders bound to one storage backend
//!    (local disk or an object-storage bucket)
//! 2. Artefacts - named in-memory images that can be filled, replaced,
//!    upscaled and saved into a project
//!
//! # Architecture
//!
//! - `naming`: suffix insertion and path-safe timestamps
//! - `storage`: the `StorageBackend` trait with local and remote variants
//! - `project`: `ProjectNode`, the folder tree that saves through a backend
//! - `artefact`: `Artefact`, the image buffer
//! - `neural`: super-resolution models and their per-factor cache
//! - `video`: frame-sequence export through ffmpeg
//! - `blueprint`: recipes saved alongside a run's output

pub mod artefact;
pub mod blueprint;
pub mod config;
pub mod error;
pub mod naming;
pub mod neural;
pub mod project;
pub mod storage;
pub mod video;

pub use artefact::Artefact;
pub use blueprint::{Blueprint, BlueprintProcessor};
pub use error::{ProjectError, Result};
pub use neural::{UpscaleFactor, UpscalerCache};
pub use project::ProjectNode;
pub use storage::{BackendKind, LocalBackend, RemoteBackend, StorageBackend};
pub use video::{FfmpegEncoder, VideoEncoder, VideoSettings};
