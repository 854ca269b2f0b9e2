use crate::error::OcrError;
use image::{DynamicImage, Rgba};

/// Adjust brightness by a signed magnitude in `-1.0..=1.0`
/// Negative values scale toward black, positive values move toward white
pub fn apply(image: DynamicImage, amount: f32) -> Result<DynamicImage, OcrError> {
    if !(-1.0..=1.0).contains(&amount) {
        return Err(OcrError::PreprocessingError(format!(
            "Brightness must be between -1 and 1, got {}",
            amount
        )));
    }

    let mut rgba = image.into_rgba8();
    for pixel in rgba.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        *pixel = Rgba([shift(r, amount), shift(g, amount), shift(b, amount), a]);
    }

    Ok(DynamicImage::ImageRgba8(rgba))
}

fn shift(value: u8, amount: f32) -> u8 {
    let v = value as f32;
    let shifted = if amount < 0.0 {
        v * (1.0 + amount)
    } else {
        v + (255.0 - v) * amount
    };
    shifted.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbaImage};

    fn grey(value: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([value, value, value, 200])))
    }

    #[test]
    fn test_brighten_moves_toward_white() {
        let result = apply(grey(100), 0.5).unwrap();
        assert_eq!(result.get_pixel(0, 0).0, [178, 178, 178, 200]);
    }

    #[test]
    fn test_darken_scales_toward_black() {
        let result = apply(grey(100), -0.5).unwrap();
        assert_eq!(result.get_pixel(0, 0).0, [50, 50, 50, 200]);
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(apply(grey(100), -2.0).is_err());
    }
}
