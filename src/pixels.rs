//! Turning caller input into an image the pipeline can work on

use crate::error::OcrError;
use image::{DynamicImage, RgbImage, RgbaImage};

/// Wrap a raw RGBA or RGB pixel buffer
///
/// The channel count is inferred from the buffer length.
pub fn from_raw_pixels(data: Vec<u8>, width: u32, height: u32) -> Result<DynamicImage, OcrError> {
    let too_large = || {
        OcrError::InvalidImage(format!("Dimensions {}x{} are too large", width, height))
    };
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(too_large)?;
    if pixels == 0 {
        return Err(OcrError::InvalidImage("Pixel buffer has no pixels".to_string()));
    }
    let rgba_len = pixels.checked_mul(4).ok_or_else(too_large)?;
    let rgb_len = pixels.checked_mul(3).ok_or_else(too_large)?;

    let len = data.len();
    if len == rgba_len {
        RgbaImage::from_raw(width, height, data)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| OcrError::InvalidImage("Invalid RGBA buffer".to_string()))
    } else if len == rgb_len {
        RgbImage::from_raw(width, height, data)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| OcrError::InvalidImage("Invalid RGB buffer".to_string()))
    } else {
        Err(OcrError::InvalidImage(format!(
            "Buffer of {} bytes is neither RGBA nor RGB for {}x{}",
            len, width, height
        )))
    }
}

/// Decode an encoded still image (PNG, JPEG, ...)
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, OcrError> {
    image::load_from_memory(bytes)
        .map_err(|e| OcrError::InvalidImage(format!("Failed to decode image: {}", e)))
}
