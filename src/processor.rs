//! End-to-end plate recognition
//!
//! Detected (or caller-supplied) regions are cropped, enhanced, recognized
//! and scanned for a plate, producing one [`OcrResult`] per region in
//! detection order. One engine session serves the whole run and is released
//! when the run ends. A recognition failure aborts the run.

use crate::engine::{EngineSettings, OcrEngine, PageSegMode, Recognition, SessionGuard};
use crate::error::OcrError;
use crate::geometry::{ColorRange, Rectangle};
use crate::plate::extract_plate;
use crate::preprocessing::{FilterConfig, Pipeline, StepTiming};
use crate::resolver::{self, DEFAULT_VERTICAL_TOLERANCE};
use crate::tracker::{self, ColorTracker, TrackerOptions};
use base64::Engine as _;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use std::time::Instant;

/// Per-run options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorOptions {
    pub color_range: ColorRange,
    pub page_segmentation_mode: PageSegMode,
    pub filters: FilterConfig,
    /// Inner-region alignment ratio, see [`resolver::VERTICAL_SCALE_PX`]
    pub vertical_tolerance: f64,
    pub tracker: TrackerOptions,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            color_range: ColorRange::default(),
            page_segmentation_mode: PageSegMode::default(),
            filters: FilterConfig::default(),
            vertical_tolerance: DEFAULT_VERTICAL_TOLERANCE,
            tracker: TrackerOptions::default(),
        }
    }
}

/// Result for one processed region
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    /// Region the crop was taken from
    pub region: Rectangle,
    /// Enhanced crop as PNG, serialized as a data URL
    #[serde(serialize_with = "png_data_url")]
    pub image: Vec<u8>,
    /// Raw recognizer output
    pub ocr_data: Recognition,
    /// Extracted plate, `None` when the text holds no plate
    pub plate: Option<String>,
    /// Crop and filter timings
    pub preprocessing: Vec<StepTiming>,
    /// Caller-owned display toggle, always created false
    pub show_ocr_data: bool,
    /// Caller-owned display toggle, true when a plate was found
    pub open: bool,
}

fn png_data_url<S>(png: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let encoded = base64::prelude::BASE64_STANDARD.encode(png);
    serializer.serialize_str(&format!("data:image/png;base64,{}", encoded))
}

/// Runs regions through crop/enhance, recognition and plate extraction
pub struct PlateProcessor {
    engine: Arc<dyn OcrEngine>,
    char_whitelist: String,
}

impl PlateProcessor {
    pub fn new(engine: Arc<dyn OcrEngine>, char_whitelist: impl Into<String>) -> Self {
        Self {
            engine,
            char_whitelist: char_whitelist.into(),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Regions whose color lies inside the configured range, in discovery order
    pub fn detect_regions(&self, image: &DynamicImage, options: &ProcessorOptions) -> Vec<Rectangle> {
        let detector = ColorTracker::new(tracker::color::DEFAULT_COLOR_LABEL, options.tracker);
        tracker::detect_regions(&detector, &image.to_rgba8(), &options.color_range)
    }

    /// The single region bracketed by two aligned detected regions, if any
    pub fn resolve_inner_region(
        &self,
        image: &DynamicImage,
        options: &ProcessorOptions,
    ) -> Option<Rectangle> {
        let rects = self.detect_regions(image, options);
        resolver::resolve_inner_region(&rects, options.vertical_tolerance)
    }

    /// Recognize every detected region
    pub fn track(
        &self,
        image: &DynamicImage,
        options: &ProcessorOptions,
    ) -> Result<Vec<OcrResult>, OcrError> {
        let rects = self.detect_regions(image, options);
        tracing::info!("Tracked {} regions", rects.len());
        self.crop_and_recognize(image, rects, options)
    }

    /// Recognize the region between two aligned detected regions
    pub fn track_inner(
        &self,
        image: &DynamicImage,
        options: &ProcessorOptions,
    ) -> Result<Vec<OcrResult>, OcrError> {
        let region = self.resolve_inner_region(image, options);
        self.crop_and_recognize(image, region.into_iter().collect(), options)
    }

    /// Recognize a caller-supplied region
    pub fn recognize_from_rect(
        &self,
        image: &DynamicImage,
        rect: Rectangle,
        options: &ProcessorOptions,
    ) -> Result<Vec<OcrResult>, OcrError> {
        self.crop_and_recognize(image, vec![rect], options)
    }

    fn crop_and_recognize(
        &self,
        image: &DynamicImage,
        rects: Vec<Rectangle>,
        options: &ProcessorOptions,
    ) -> Result<Vec<OcrResult>, OcrError> {
        let (width, height) = image.dimensions();
        let rects: Vec<Rectangle> = rects
            .into_iter()
            .filter(|rect| {
                let usable = rect.clamp_to(width, height).is_some();
                if !usable {
                    tracing::warn!(
                        "Skipping region {}x{} at ({}, {}): empty inside {}x{} image",
                        rect.width,
                        rect.height,
                        rect.x,
                        rect.y,
                        width,
                        height
                    );
                }
                usable
            })
            .collect();

        if rects.is_empty() {
            tracing::info!("No region to recognize");
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let pipeline = Pipeline::new(options.filters);
        let settings = EngineSettings {
            char_whitelist: self.char_whitelist.clone(),
            page_seg_mode: options.page_segmentation_mode,
        };

        let mut session = SessionGuard::acquire(self.engine.as_ref(), &settings)?;
        let mut results = Vec::with_capacity(rects.len());

        for (i, rect) in rects.into_iter().enumerate() {
            let prepared = pipeline.prepare(image, &rect)?;
            let ocr_data = session.recognize(&prepared.png)?;
            let plate = extract_plate(&ocr_data.lines);

            tracing::debug!(
                "Region {} ({}x{} at {},{}): {} lines, plate {:?}",
                i,
                rect.width,
                rect.height,
                rect.x,
                rect.y,
                ocr_data.lines.len(),
                plate
            );

            results.push(OcrResult {
                region: rect,
                image: prepared.png,
                ocr_data,
                open: plate.is_some(),
                plate,
                preprocessing: prepared.steps,
                show_ocr_data: false,
            });
        }

        session.release();

        tracing::info!(
            "Recognized {} regions in {}ms, {} plates",
            results.len(),
            start.elapsed().as_millis(),
            results.iter().filter(|r| r.plate.is_some()).count()
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::ScriptedEngine;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::Ordering;

    fn paint(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32) {
        for py in y..y + h {
            for px in x..x + w {
                img.put_pixel(px, py, Rgba([240, 240, 240, 255]));
            }
        }
    }

    /// Two white markers at similar heights plus one far below
    fn scene() -> DynamicImage {
        let mut img = RgbaImage::from_pixel(300, 200, Rgba([20, 20, 20, 255]));
        paint(&mut img, 10, 40, 30, 30);
        paint(&mut img, 200, 50, 40, 25);
        paint(&mut img, 100, 150, 50, 30);
        DynamicImage::ImageRgba8(img)
    }

    fn processor(engine: &Arc<ScriptedEngine>) -> PlateProcessor {
        PlateProcessor::new(engine.clone(), crate::engine::DEFAULT_CHAR_WHITELIST)
    }

    #[test]
    fn test_track_produces_one_result_per_region_in_order() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok("NOISE".into()),
            Ok("AB1Z3CD".into()),
            Ok("HELLO WORLD".into()),
        ]));

        let results = processor(&engine)
            .track(&scene(), &ProcessorOptions::default())
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].region.y, 40);
        assert_eq!(results[1].region.y, 50);
        assert_eq!(results[2].region.y, 150);
        assert_eq!(results[0].plate, None);
        assert_eq!(results[1].plate.as_deref(), Some("AB173CD"));
        assert!(results[1].open);
        assert!(!results[1].show_ocr_data);
        assert_eq!(engine.counters.loads.load(Ordering::SeqCst), 1);
        assert_eq!(engine.counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_track_inner_recognizes_gap_between_markers() {
        let engine = Arc::new(ScriptedEngine::new(vec![Ok("ZZ999YY".into())]));

        let results = processor(&engine)
            .track_inner(&scene(), &ProcessorOptions::default())
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].region, Rectangle::new(40, 30, 160, 40).with_color("white"));
        assert_eq!(results[0].plate.as_deref(), Some("ZZ999YY"));
    }

    #[test]
    fn test_no_regions_skips_engine_entirely() {
        let engine = Arc::new(ScriptedEngine::new(vec![]));
        let blank = DynamicImage::ImageRgba8(RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255])));

        let results = processor(&engine)
            .track(&blank, &ProcessorOptions::default())
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(engine.counters.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_recognition_failure_aborts_run_and_releases_engine() {
        let engine = Arc::new(ScriptedEngine::new(vec![
            Ok("AB123CD".into()),
            Err("engine crashed".into()),
            Ok("XY123ZZ".into()),
        ]));

        let result = processor(&engine).track(&scene(), &ProcessorOptions::default());

        assert!(matches!(result, Err(OcrError::RecognitionError(_))));
        assert_eq!(engine.counters.recognitions.load(Ordering::SeqCst), 2);
        assert_eq!(engine.counters.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_failure_surfaces_initialization_error() {
        let mut engine = ScriptedEngine::new(vec![]);
        engine.fail_load = true;
        let processor = PlateProcessor::new(Arc::new(engine), "0123456789");

        let result = processor.recognize_from_rect(
            &scene(),
            Rectangle::new(0, 0, 10, 10),
            &ProcessorOptions::default(),
        );
        assert!(matches!(result, Err(OcrError::InitializationError(_))));
    }

    #[test]
    fn test_recognize_from_rect_uses_given_region() {
        let engine = Arc::new(ScriptedEngine::new(vec![Ok("AB 123 CD".into())]));
        let options = ProcessorOptions {
            filters: FilterConfig {
                greyscale: true,
                normalize: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let results = processor(&engine)
            .recognize_from_rect(&scene(), Rectangle::new(5, 5, 60, 40), &options)
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].plate.as_deref(), Some("AB123CD"));
        let steps: Vec<&str> = results[0].preprocessing.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(steps, vec!["crop", "greyscale", "normalize"]);
    }

    #[test]
    fn test_region_outside_image_is_skipped() {
        let engine = Arc::new(ScriptedEngine::new(vec![]));
        let results = processor(&engine)
            .recognize_from_rect(
                &scene(),
                Rectangle::new(1000, 1000, 10, 10),
                &ProcessorOptions::default(),
            )
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(engine.counters.loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_options_from_json() {
        let options: ProcessorOptions = serde_json::from_str(
            r#"{
                "colorRange": {"minR": 0, "maxR": 60, "minG": 0, "maxG": 60, "minB": 100, "maxB": 255},
                "pageSegmentationMode": "singleLine",
                "filters": {"greyscale": true, "contrast": false, "brightness": 0.2},
                "verticalTolerance": 0.5
            }"#,
        )
        .unwrap();

        assert_eq!(options.color_range.max_r, 60);
        assert_eq!(options.page_segmentation_mode, PageSegMode::SingleLine);
        assert_eq!(options.filters.brightness, Some(0.2));
        assert_eq!(options.vertical_tolerance, 0.5);
        assert_eq!(options.tracker, TrackerOptions::default());
    }

    #[test]
    fn test_result_serializes_image_as_data_url() {
        let engine = Arc::new(ScriptedEngine::new(vec![Ok("AB123CD".into())]));
        let results = processor(&engine)
            .recognize_from_rect(&scene(), Rectangle::new(0, 0, 20, 20), &ProcessorOptions::default())
            .unwrap();

        let json = serde_json::to_value(&results[0]).unwrap();
        assert!(json["image"].as_str().unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(json["plate"], "AB123CD");
        assert_eq!(json["showOcrData"], false);
        assert_eq!(json["ocrData"]["lines"][0]["text"], "AB123CD");
    }
}
