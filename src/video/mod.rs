//! Video export collaborators
//!
//! Frames are handed to a [`VideoEncoder`] as an ordered, equally shaped
//! sequence. The bundled [`FfmpegEncoder`] shells out to the system `ffmpeg`
//! binary; container and codec internals stay on its side.

mod ffmpeg;

use std::path::Path;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::{ProjectError, Result};

pub use ffmpeg::FfmpegEncoder;

/// Frame rate and codec for an export.
///
/// Serialisable so export settings can travel inside a blueprint; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Frames per second
    pub fps: f64,
    /// Codec identifier: a four-character code such as `avc1` or `hvc1`,
    /// or an encoder name understood by the encoder
    pub codec: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        VideoSettings {
            fps: 24.0,
            codec: "avc1".to_string(),
        }
    }
}

impl VideoSettings {
    pub fn new(fps: f64, codec: impl Into<String>) -> Self {
        VideoSettings {
            fps,
            codec: codec.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ProjectError::invalid(format!(
                "fps must be positive, got {}",
                self.fps
            )));
        }
        if self.codec.trim().is_empty() {
            return Err(ProjectError::invalid("codec must not be empty"));
        }
        Ok(())
    }
}

/// Muxes an ordered frame sequence into one video file
pub trait VideoEncoder {
    fn encode(&self, frames: &[DynamicImage], output: &Path, settings: &VideoSettings) -> Result<()>;
}

/// Check that `frames` is non-empty and every frame has the first one's size.
///
/// Returns the common `(width, height)`.
pub fn frame_dimensions(frames: &[DynamicImage], location: &str) -> Result<(u32, u32)> {
    let first = frames.first().ok_or_else(|| ProjectError::EmptyFrameSet {
        location: location.to_string(),
    })?;
    let size = (first.width(), first.height());

    for (index, frame) in frames.iter().enumerate().skip(1) {
        if (frame.width(), frame.height()) != size {
            return Err(ProjectError::invalid(format!(
                "frame {} is {}x{}, expected {}x{}",
                index,
                frame.width(),
                frame.height(),
                size.0,
                size.1
            )));
        }
    }

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = VideoSettings::default();
        assert_eq!(settings.fps, 24.0);
        assert_eq!(settings.codec, "avc1");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_from_blueprint_json() {
        let settings: VideoSettings = serde_json::from_str(r#"{ "fps": 12.5 }"#).unwrap();
        assert_eq!(settings, VideoSettings::new(12.5, "avc1"));

        let text = serde_json::to_string(&VideoSettings::new(30.0, "hvc1")).unwrap();
        let back: VideoSettings = serde_json::from_str(&text).unwrap();
        assert_eq!(back.codec, "hvc1");
    }

    #[test]
    fn test_invalid_settings() {
        assert!(VideoSettings::new(0.0, "avc1").validate().is_err());
        assert!(VideoSettings::new(f64::NAN, "avc1").validate().is_err());
        assert!(VideoSettings::new(30.0, " ").validate().is_err());
    }

    #[test]
    fn test_frame_dimensions() {
        let frames = vec![DynamicImage::new_rgb8(4, 2), DynamicImage::new_rgba8(4, 2)];
        assert_eq!(frame_dimensions(&frames, "x").unwrap(), (4, 2));

        let mixed = vec![DynamicImage::new_rgb8(4, 2), DynamicImage::new_rgb8(2, 4)];
        assert_eq!(
            frame_dimensions(&mixed, "x").unwrap_err().error_code(),
            "INVALID_ARGUMENT"
        );

        match frame_dimensions(&[], "frames") {
            Err(ProjectError::EmptyFrameSet { location }) => assert_eq!(location, "frames"),
            other => panic!("Expected EmptyFrameSet, got: {:?}", other),
        }
    }
}
