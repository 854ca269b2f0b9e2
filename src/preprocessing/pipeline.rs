use crate::error::OcrError;
use crate::geometry::Rectangle;
use image::{DynamicImage, ImageFormat};
use serde::Serialize;
use std::io::Cursor;
use std::time::Instant;

use super::filters::FilterConfig;
use super::steps;

/// Timing information for a single preprocessing step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Cropped, enhanced and encoded region ready for recognition
#[derive(Debug, Clone, Serialize)]
pub struct PreparedImage {
    /// Enhanced crop (not serialized)
    #[serde(skip)]
    pub image: DynamicImage,
    /// PNG encoding of `image`, what the recognizer receives
    #[serde(skip)]
    pub png: Vec<u8>,
    /// Total preprocessing time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings, in application order
    pub steps: Vec<StepTiming>,
}

/// Crop/enhance pipeline
///
/// Crops first so filters only touch the region of interest, then applies
/// whichever filters are enabled in the fixed order greyscale, contrast,
/// brightness, normalize.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    filters: FilterConfig,
}

impl Pipeline {
    pub fn new(filters: FilterConfig) -> Self {
        Self { filters }
    }

    /// Crop `image` to `rect`, enhance and encode it
    pub fn prepare(&self, image: &DynamicImage, rect: &Rectangle) -> Result<PreparedImage, OcrError> {
        let start = Instant::now();
        let mut steps_timing = Vec::new();

        let crop_start = Instant::now();
        let mut img = steps::crop::apply(image, rect)?;
        steps_timing.push(StepTiming {
            name: "crop".to_string(),
            time_ms: crop_start.elapsed().as_millis() as u64,
        });

        img = self.enhance(img, &mut steps_timing)?;

        let png = encode_png(&img)?;

        Ok(PreparedImage {
            image: img,
            png,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: steps_timing,
        })
    }

    /// Apply the enabled filters to an already-cropped image
    pub fn enhance(
        &self,
        image: DynamicImage,
        timings: &mut Vec<StepTiming>,
    ) -> Result<DynamicImage, OcrError> {
        if self.filters.is_noop() {
            return Ok(image);
        }

        let mut img = image;

        if self.filters.greyscale {
            img = self.run_step("greyscale", img, timings, steps::grayscale::apply)?;
        }

        if let Some(amount) = self.filters.contrast {
            img = self.run_step("contrast", img, timings, |i| steps::contrast::apply(i, amount))?;
        }

        if let Some(amount) = self.filters.brightness {
            img = self.run_step("brightness", img, timings, |i| {
                steps::brightness::apply(i, amount)
            })?;
        }

        if self.filters.normalize {
            img = self.run_step("normalize", img, timings, steps::normalize::apply)?;
        }

        Ok(img)
    }

    fn run_step<F>(
        &self,
        name: &str,
        img: DynamicImage,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<DynamicImage, OcrError>
    where
        F: FnOnce(DynamicImage) -> Result<DynamicImage, OcrError>,
    {
        let step_start = Instant::now();
        let result = step_fn(img)?;
        timings.push(StepTiming {
            name: name.to_string(),
            time_ms: step_start.elapsed().as_millis() as u64,
        });
        Ok(result)
    }
}

/// Encode as PNG in memory
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, OcrError> {
    let mut data = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut data), ImageFormat::Png)
        .map_err(|e| OcrError::PreprocessingError(format!("Failed to encode PNG: {}", e)))?;
    Ok(data)
}
