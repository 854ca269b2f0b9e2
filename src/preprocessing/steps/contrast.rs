use crate::error::OcrError;
use image::{DynamicImage, Rgba};

/// Adjust contrast by a signed magnitude in `-1.0..=1.0`
///
/// Each color channel is scaled around mid-grey by `(1 + amount) / (1 - amount)`;
/// alpha is left alone.
pub fn apply(image: DynamicImage, amount: f32) -> Result<DynamicImage, OcrError> {
    if !(-1.0..=1.0).contains(&amount) {
        return Err(OcrError::PreprocessingError(format!(
            "Contrast must be between -1 and 1, got {}",
            amount
        )));
    }

    let factor = (1.0 + amount) / (1.0 - amount).max(f32::EPSILON);
    let mut rgba = image.into_rgba8();
    for pixel in rgba.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([stretch(r, factor), stretch(g, factor), stretch(b, factor), a]);
    }

    Ok(DynamicImage::ImageRgba8(rgba))
}

fn stretch(value: u8, factor: f32) -> u8 {
    let delta = value as f32 - 127.0;
    if delta == 0.0 {
        return value;
    }
    (delta * factor + 127.0).round().clamp(0.0, 255.0) as u8
}
