use crate::error::OcrError;
use image::{DynamicImage, Rgba, RgbaImage};

/// Normalize each color channel using histogram stretching
/// Maps every channel's observed range onto the full 0-255 range
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let rgba = image.into_rgba8();
    let bounds = channel_bounds(&rgba);

    let normalized = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
        Rgba([
            stretch(r, bounds[0]),
            stretch(g, bounds[1]),
            stretch(b, bounds[2]),
            a,
        ])
    });

    Ok(DynamicImage::ImageRgba8(normalized))
}

fn stretch(value: u8, (min_val, max_val): (u8, u8)) -> u8 {
    // Flat channel: nothing to stretch
    if max_val <= min_val {
        return value;
    }
    let range = (max_val - min_val) as f32;
    ((value - min_val) as f32 / range * 255.0).round() as u8
}

/// (min, max) per RGB channel
fn channel_bounds(img: &RgbaImage) -> [(u8, u8); 3] {
    let mut bounds = [(255u8, 0u8); 3];

    for pixel in img.pixels() {
        for (channel, bound) in bounds.iter_mut().enumerate() {
            let val = pixel.0[channel];
            bound.0 = bound.0.min(val);
            bound.1 = bound.1.max(val);
        }
    }

    bounds
}
