use crate::error::OcrError;
use image::DynamicImage;

/// Convert to luminance, keeping the alpha channel
/// Must run before contrast and brightness so their output is deterministic
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let grey = DynamicImage::ImageLumaA8(image.to_luma_alpha8());
    Ok(DynamicImage::ImageRgba8(grey.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    #[test]
    fn test_grayscale_equalizes_channels() {
        let mut img = RgbaImage::new(10, 10);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 128]));

        let result = apply(DynamicImage::ImageRgba8(img)).unwrap();

        let [r, g, b, a] = result.get_pixel(0, 0).0;
        assert!(r > 0 && r == g && g == b);
        assert_eq!(a, 255);

        let [r, g, b, a] = result.get_pixel(1, 0).0;
        assert!(r == g && g == b);
        assert_eq!(a, 128);
    }

    #[test]
    fn test_grayscale_preserves_dimensions() {
        let img = RgbaImage::new(100, 50);
        let result = apply(DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(result.width(), 100);
        assert_eq!(result.height(), 50);
    }
}
