//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use. The models are
//! loaded once; each session borrows them and applies its own whitelist and
//! line layout to the output.

use super::models;
use crate::config::Config;
use crate::engine::{EngineSession, EngineSettings, OcrEngine, PageSegMode, Recognition};
use crate::error::OcrError;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams};
use rten::Model;
use std::sync::Arc;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// OCR Engine wrapping the ocrs library
pub struct OcrsEngine {
    engine: Arc<OcrsOcrEngine>,
}

impl OcrsEngine {
    /// Create the engine, downloading models if needed
    pub fn new(_config: &Config) -> Result<Self, OcrError> {
        tracing::info!("Initializing ocrs OCR engine...");

        let cache_dir = models::cache_dir(None)?;
        let detection_model_path =
            models::ensure_downloaded(DETECTION_MODEL_URL, &cache_dir, "text-detection.rten")?;
        let recognition_model_path =
            models::ensure_downloaded(RECOGNITION_MODEL_URL, &cache_dir, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            OcrError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            OcrError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self {
            engine: Arc::new(engine),
        })
    }
}

impl OcrEngine for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn load(&self, settings: &EngineSettings) -> Result<Box<dyn EngineSession>, OcrError> {
        if settings.char_whitelist.is_empty() {
            return Err(OcrError::ConfigurationError(
                "Character whitelist must not be empty".to_string(),
            ));
        }

        Ok(Box::new(OcrsSession {
            engine: self.engine.clone(),
            settings: settings.clone(),
        }))
    }
}

struct OcrsSession {
    engine: Arc<OcrsOcrEngine>,
    settings: EngineSettings,
}

impl EngineSession for OcrsSession {
    fn recognize(&mut self, image: &[u8]) -> Result<Recognition, OcrError> {
        let img = image::load_from_memory(image)
            .map_err(|e| OcrError::RecognitionError(format!("Failed to decode image: {}", e)))?;

        // HWC RGB, which is what ImageSource::from_bytes expects
        let rgb_img = img.into_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            OcrError::RecognitionError(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::RecognitionError(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| OcrError::RecognitionError(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| OcrError::RecognitionError(format!("Failed to recognize text: {}", e)))?;

        let lines: Vec<String> = line_texts
            .iter()
            .filter_map(|line| line.as_ref())
            .map(|line| {
                let words = line
                    .words()
                    .map(|word| word.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.settings.retain_allowed(&words.to_uppercase())
            })
            .collect();

        let text = join_lines(&lines, self.settings.page_seg_mode);
        tracing::debug!("ocrs recognized {} lines", lines.len());

        Ok(Recognition::from_text(text))
    }

    fn release(self: Box<Self>) {}
}

/// Lay recognized lines out per segmentation mode
fn join_lines(lines: &[String], mode: PageSegMode) -> String {
    match mode {
        PageSegMode::SingleBlock => lines.join("\n"),
        PageSegMode::SingleLine => lines.join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_mode_collapses_lines() {
        let lines = vec!["AB 123".to_string(), "CD".to_string()];
        assert_eq!(join_lines(&lines, PageSegMode::SingleLine), "AB 123 CD");
        assert_eq!(join_lines(&lines, PageSegMode::SingleBlock), "AB 123\nCD");
    }
}
