//! Super-resolution collaborators
//!
//! This module provides:
//! - `SuperResolutionModel` trait for anything that can upscale an image
//! - `ModelLoader` trait for producing a model per scale factor
//! - `UpscalerCache`, the explicit per-factor cache of loaded models
//! - A bridge loader for the external inference service and an in-process
//!   resampling loader for tests and offline use

mod bridge;
mod cache;
mod model;
mod resample;

pub use bridge::{BridgeLoader, BridgeModel, ModelResources};
pub use cache::UpscalerCache;
pub use model::{ModelLoader, SuperResolutionModel, UpscaleFactor};
pub use resample::{ResampleLoader, ResampleModel};
