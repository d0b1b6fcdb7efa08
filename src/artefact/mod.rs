//! Artefacts
//!
//! An [`Artefact`] is a named in-memory image: 8-bit samples in L, RGB or
//! RGBA layout. It always holds pixel data; width and height are read from
//! the current buffer, so they can never drift from it.
//!
//! Artefacts are not owned by a project. Saving hands a copy of the pixels
//! to a [`ProjectNode`] and keeps no reference to it afterwards.

use image::{DynamicImage, Rgb, RgbImage};

use crate::error::{ProjectError, Result};
use crate::naming::insert_suffix;
use crate::neural::{UpscaleFactor, UpscalerCache};
use crate::project::{images, ProjectNode};

/// A named image buffer
#[derive(Debug, Clone)]
pub struct Artefact {
    name: String,
    pixels: DynamicImage,
}

impl Artefact {
    /// Create an artefact from explicit pixels, or an opaque black image of
    /// `size` (width, height) when no pixels are given.
    pub fn new(
        name: &str,
        size: Option<(u32, u32)>,
        pixels: Option<DynamicImage>,
    ) -> Result<Self> {
        validate_name(name)?;

        let pixels = match (pixels, size) {
            (Some(pixels), _) => normalize_pixels(pixels),
            (None, Some((width, height))) => {
                if width == 0 || height == 0 {
                    return Err(ProjectError::invalid(format!(
                        "size must be non-zero, got {}x{}",
                        width, height
                    )));
                }
                solid(width, height, [0, 0, 0])
            }
            (None, None) => {
                return Err(ProjectError::invalid("either size or pixels must be given"));
            }
        };

        Ok(Self {
            name: name.to_string(),
            pixels,
        })
    }

    /// Opaque black artefact of the given size
    pub fn with_size(name: &str, width: u32, height: u32) -> Result<Self> {
        Self::new(name, Some((width, height)), None)
    }

    /// Artefact wrapping existing pixels
    pub fn from_pixels(name: &str, pixels: DynamicImage) -> Result<Self> {
        Self::new(name, None, Some(pixels))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// (width, height)
    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Replace the buffer with a solid RGB image of the current size
    pub fn fill(&mut self, rgb: [u8; 3]) {
        self.pixels = solid(self.width(), self.height(), rgb);
    }

    /// Replace the buffer wholesale; the size follows the new pixels
    pub fn update(&mut self, pixels: DynamicImage) {
        self.pixels = normalize_pixels(pixels);
    }

    /// Produce an upscaled copy through the super-resolution model cached
    /// for `factor` (2, 3 or 4).
    ///
    /// The copy is named `new_name`, or this artefact's name with `@x{factor}`
    /// inserted before the extension.
    pub fn request_upscale(
        &self,
        upscalers: &mut UpscalerCache,
        factor: u32,
        new_name: Option<&str>,
    ) -> Result<Artefact> {
        let factor = UpscaleFactor::try_from(factor)?;
        let name = match new_name {
            Some(name) => name.to_string(),
            None => insert_suffix(&self.name, Some(&factor.name_suffix())),
        };
        validate_name(&name)?;

        let upscaled = upscalers.upsample(factor, &self.pixels)?;
        log::debug!(
            "Upscaled {} from {}x{} to {}x{}",
            self.name,
            self.width(),
            self.height(),
            upscaled.width(),
            upscaled.height()
        );

        Artefact::from_pixels(&name, upscaled)
    }

    /// Save into `node`, inserting `suffix` before the extension.
    ///
    /// With name `icon.png` and suffix `@3x` the file is `icon@3x.png`.
    pub fn save(&self, node: &ProjectNode, suffix: Option<&str>) -> Result<String> {
        let file_name = insert_suffix(&self.name, suffix);
        node.save_image(&self.pixels, &file_name, None)
    }
}

/// Bring any decoded layout into L8, RGB8 or RGBA8
pub(crate) fn normalize_pixels(pixels: DynamicImage) -> DynamicImage {
    let supported = matches!(
        pixels,
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_)
    );

    if supported {
        pixels
    } else if pixels.color().has_alpha() {
        DynamicImage::ImageRgba8(pixels.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(pixels.to_rgb8())
    }
}

fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// Artefact names must imply an image format through their extension
fn validate_name(name: &str) -> Result<()> {
    if !images::is_image_name(name) {
        return Err(ProjectError::invalid(format!(
            "artefact name '{}' needs an image extension such as .png",
            name
        )));
    }
    Ok(())
}
