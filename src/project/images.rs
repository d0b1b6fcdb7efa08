//! Image encode/decode helpers used by project nodes

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::error::Result;

/// Format implied by the extension of `file_name`, if any
pub fn format_for(file_name: &str) -> Option<ImageFormat> {
    ImageFormat::from_path(Path::new(file_name)).ok()
}

/// Whether `file_name` carries an image extension the codec knows
pub fn is_image_name(file_name: &str) -> bool {
    format_for(file_name).is_some()
}

/// Serialize `image` in memory
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);

    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg if image.color().has_alpha() => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format)?
        }
        _ => image.write_to(&mut cursor, format)?,
    }

    Ok(bytes)
}

/// Decode bytes read from storage, using the extension as a format hint
pub fn decode(bytes: &[u8], file_name: &str) -> Result<DynamicImage> {
    let image = match format_for(file_name) {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(image)
}
