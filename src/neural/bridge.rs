//! Inference bridge models
//!
//! Real upscaling runs in an external service that holds the EDSR models.
//! This module locates the model resources for a factor and talks to the
//! bridge over HTTP: the request body is a PNG, the response body is the
//! upscaled PNG.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client;

use super::model::{ModelLoader, SuperResolutionModel, UpscaleFactor};
use crate::config;
use crate::error::{ProjectError, Result};

/// Model architecture name understood by the bridge
pub const MODEL_NAME: &str = "edsr";

/// Directory holding the pretrained model files
#[derive(Debug, Clone)]
pub struct ModelResources {
    dir: PathBuf,
}

impl ModelResources {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Use `PROJECT_UTIL_MODEL_DIR`, defaulting to `ml-models`
    pub fn from_env() -> Self {
        Self::new(config::var_or(config::MODEL_DIR, config::DEFAULT_MODEL_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the model file for `factor`, e.g. `ml-models/EDSR_x3.pb`
    pub fn model_path(&self, factor: UpscaleFactor) -> PathBuf {
        self.dir.join(format!("EDSR_x{}.pb", factor.value()))
    }
}

/// Loads bridge-backed models after checking the model file is installed
#[derive(Debug, Clone)]
pub struct BridgeLoader {
    url: String,
    timeout_ms: u64,
    resources: ModelResources,
}

impl BridgeLoader {
    pub fn new(url: impl Into<String>, timeout_ms: u64, resources: ModelResources) -> Self {
        Self {
            url: url.into(),
            timeout_ms,
            resources,
        }
    }

    /// Configure from `PROJECT_UTIL_SUPERRES_URL`,
    /// `PROJECT_UTIL_SUPERRES_TIMEOUT_MS` and `PROJECT_UTIL_MODEL_DIR`
    pub fn from_env() -> Self {
        let timeout_ms = config::var(config::SUPERRES_TIMEOUT_MS)
            .and_then(|s| s.parse().ok())
            .unwrap_or(config::DEFAULT_SUPERRES_TIMEOUT_MS);

        Self::new(
            config::var_or(config::SUPERRES_URL, config::DEFAULT_SUPERRES_URL),
            timeout_ms,
            ModelResources::from_env(),
        )
    }

    pub fn resources(&self) -> &ModelResources {
        &self.resources
    }
}

impl ModelLoader for BridgeLoader {
    fn load(&self, factor: UpscaleFactor) -> Result<Arc<dyn SuperResolutionModel>> {
        let model_path = self.resources.model_path(factor);
        if !model_path.is_file() {
            return Err(ProjectError::NotFound {
                name: model_path.display().to_string(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| ProjectError::Inference {
                reason: format!("cannot build HTTP client: {}", e),
            })?;

        Ok(Arc::new(BridgeModel {
            client,
            url: self.url.trim_end_matches('/').to_string(),
            timeout_ms: self.timeout_ms,
            factor,
            model_path,
        }))
    }
}

/// One loaded model on the bridge
#[derive(Debug)]
pub struct BridgeModel {
    client: Client,
    url: String,
    timeout_ms: u64,
    factor: UpscaleFactor,
    model_path: PathBuf,
}

impl BridgeModel {
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl SuperResolutionModel for BridgeModel {
    fn factor(&self) -> UpscaleFactor {
        self.factor
    }

    fn upsample(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let mut body = Vec::new();
        image.write_to(&mut Cursor::new(&mut body), ImageFormat::Png)?;

        let url = format!("{}/upscale", self.url);
        let response = self
            .client
            .post(&url)
            .query(&[
                ("model", MODEL_NAME.to_string()),
                ("scale", self.factor.value().to_string()),
                ("model_path", self.model_path.display().to_string()),
            ])
            .header("content-type", "image/png")
            .body(body)
            .send()
            .map_err(|e| ProjectError::Inference {
                reason: if e.is_timeout() {
                    format!("bridge timed out after {} ms", self.timeout_ms)
                } else if e.is_connect() {
                    format!("cannot connect to bridge at {}: {}", self.url, e)
                } else {
                    e.to_string()
                },
            })?;

        if !response.status().is_success() {
            return Err(ProjectError::Inference {
                reason: format!("bridge returned error: {}", response.status()),
            });
        }

        let bytes = response.bytes().map_err(|e| ProjectError::Inference {
            reason: format!("invalid response from bridge: {}", e),
        })?;
        let upscaled = image::load_from_memory(&bytes)?;

        let expected = (image.width() * self.factor.value(), image.height() * self.factor.value());
        if (upscaled.width(), upscaled.height()) != expected {
            log::warn!(
                "Bridge returned {}x{}, expected {}x{}",
                upscaled.width(),
                upscaled.height(),
                expected.0,
                expected.1
            );
        }

        Ok(match_layout(upscaled, image))
    }
}

/// Convert `output` to the 8-bit layout `input` normalises to (L, RGB or RGBA)
fn match_layout(output: DynamicImage, input: &DynamicImage) -> DynamicImage {
    match input {
        DynamicImage::ImageLuma8(_) => DynamicImage::ImageLuma8(output.to_luma8()),
        _ if input.color().has_alpha() => DynamicImage::ImageRgba8(output.to_rgba8()),
        _ => DynamicImage::ImageRgb8(output.to_rgb8()),
    }
}
