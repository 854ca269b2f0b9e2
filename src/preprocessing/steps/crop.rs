use crate::error::OcrError;
use crate::geometry::Rectangle;
use image::{DynamicImage, GenericImageView};

/// Crop to the region of interest, clamped to the image bounds
pub fn apply(image: &DynamicImage, rect: &Rectangle) -> Result<DynamicImage, OcrError> {
    let (width, height) = image.dimensions();
    let (x, y, w, h) = rect.clamp_to(width, height).ok_or_else(|| {
        OcrError::PreprocessingError(format!(
            "Region {}x{} at ({}, {}) lies outside the {}x{} image",
            rect.width, rect.height, rect.x, rect.y, width, height
        ))
    })?;

    Ok(image.crop_imm(x, y, w, h))
}
