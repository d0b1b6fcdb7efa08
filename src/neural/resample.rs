//! In-process resampling upscaler
//!
//! Stands in for a learned model when no inference service is available.
//! Output has the right dimensions and layout, but no detail is invented.

use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;

use super::model::{ModelLoader, SuperResolutionModel, UpscaleFactor};
use crate::error::Result;

/// Lanczos3 resampling at a fixed factor
#[derive(Debug, Clone, Copy)]
pub struct ResampleModel {
    factor: UpscaleFactor,
}

impl ResampleModel {
    pub fn new(factor: UpscaleFactor) -> Self {
        Self { factor }
    }
}

impl SuperResolutionModel for ResampleModel {
    fn factor(&self) -> UpscaleFactor {
        self.factor
    }

    fn upsample(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let scale = self.factor.value();
        Ok(image.resize_exact(
            image.width() * scale,
            image.height() * scale,
            FilterType::Lanczos3,
        ))
    }
}

/// Loader producing [`ResampleModel`]s; loading never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct ResampleLoader;

impl ModelLoader for ResampleLoader {
    fn load(&self, factor: UpscaleFactor) -> Result<Arc<dyn SuperResolutionModel>> {
        Ok(Arc::new(ResampleModel::new(factor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_resample_scales_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 3, Rgb([10, 20, 30])));
        let model = ResampleLoader.load(UpscaleFactor::X3).unwrap();

        let upscaled = model.upsample(&image).unwrap();

        assert_eq!((upscaled.width(), upscaled.height()), (15, 9));
        assert!(matches!(upscaled, DynamicImage::ImageRgb8(_)));
        let centre = upscaled.to_rgb8().get_pixel(7, 4).0;
        for (got, want) in centre.iter().zip([10u8, 20, 30]) {
            assert!(got.abs_diff(want) <= 1, "{:?}", centre);
        }
    }
}
