//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Honors the character whitelist and page
//! segmentation mode natively. Uses tesseract-static crate for static linking
//! (no system dependencies). Downloads tessdata (training data) automatically
//! on first use. Every session owns its own Tesseract instance.

use super::models;
use crate::config::Config;
use crate::engine::{EngineSession, EngineSettings, OcrEngine, Recognition};
use crate::error::OcrError;
use tesseract_static::tesseract::Tesseract;

/// Tesseract OCR Engine
pub struct LeptessEngine {
    /// Path to tessdata directory
    tessdata_path: String,
    /// Language for OCR
    language: String,
}

impl LeptessEngine {
    /// Create a new Tesseract-based OCR engine
    pub fn new(config: &Config) -> Result<Self, OcrError> {
        let language = config.language.clone();

        let tessdata_path = match &config.tessdata_path {
            Some(path) => path.clone(),
            None => ensure_tessdata_available(&language)?,
        };

        // Validate that tessdata is accessible by doing a test initialization
        let test_tess = Tesseract::new(Some(&tessdata_path), Some(&language)).map_err(|e| {
            OcrError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;
        drop(test_tess);

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            tessdata_path,
            language
        );

        Ok(Self {
            tessdata_path,
            language,
        })
    }
}

impl OcrEngine for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - native whitelist and page segmentation support"
    }

    fn load(&self, settings: &EngineSettings) -> Result<Box<dyn EngineSession>, OcrError> {
        let tess = Tesseract::new(Some(&self.tessdata_path), Some(&self.language))
            .map_err(|e| OcrError::InitializationError(format!("Failed to create Tesseract: {}", e)))?;

        let tess = tess
            .set_variable("tessedit_char_whitelist", &settings.char_whitelist)
            .map_err(|e| OcrError::ConfigurationError(format!("Failed to set whitelist: {}", e)))?
            .set_variable("tessedit_pageseg_mode", settings.page_seg_mode.tesseract_value())
            .map_err(|e| {
                OcrError::ConfigurationError(format!("Failed to set page segmentation mode: {}", e))
            })?;

        Ok(Box::new(LeptessSession { tess: Some(tess) }))
    }
}

struct LeptessSession {
    tess: Option<Tesseract>,
}

impl EngineSession for LeptessSession {
    fn recognize(&mut self, image: &[u8]) -> Result<Recognition, OcrError> {
        let tess = self.tess.take().ok_or_else(|| {
            OcrError::RecognitionError("Tesseract instance lost after an earlier failure".to_string())
        })?;

        let bmp_data = to_bmp(image)?;

        let tess = tess.set_image_from_mem(&bmp_data).map_err(|e| {
            OcrError::RecognitionError(format!(
                "Failed to set image ({} bytes): {}",
                bmp_data.len(),
                e
            ))
        })?;

        let mut tess = tess
            .recognize()
            .map_err(|e| OcrError::RecognitionError(format!("Failed to recognize text: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::RecognitionError(format!("Failed to get text: {}", e)))?;

        self.tess = Some(tess);
        Ok(Recognition::from_text(text))
    }

    fn release(mut self: Box<Self>) {
        drop(self.tess.take());
    }
}

/// Re-encode as BMP (always supported by leptonica)
fn to_bmp(image: &[u8]) -> Result<Vec<u8>, OcrError> {
    let img = image::load_from_memory(image)
        .map_err(|e| OcrError::RecognitionError(format!("Failed to decode image: {}", e)))?;
    let rgb_img = img.to_rgb8();

    let mut bmp_data = Vec::new();
    rgb_img
        .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
        .map_err(|e| OcrError::RecognitionError(format!("Failed to convert to BMP: {}", e)))?;

    tracing::debug!(
        "Prepared {}x{} image for Tesseract, BMP size: {} bytes",
        rgb_img.width(),
        rgb_img.height(),
        bmp_data.len()
    );
    Ok(bmp_data)
}

/// Ensure tessdata is available, downloading if needed
fn ensure_tessdata_available(language: &str) -> Result<String, OcrError> {
    let cache_dir = models::cache_dir(Some("tessdata"))?;
    let traineddata_file = format!("{}.traineddata", language);

    models::ensure_downloaded(&tessdata_url(language), &cache_dir, &traineddata_file)?;

    // Tesseract expects the directory, not the file
    cache_dir
        .to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| OcrError::InitializationError("Invalid tessdata path".to_string()))
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};

    #[test]
    fn test_tessdata_url_points_at_fast_models() {
        assert!(tessdata_url("eng").ends_with("tessdata_fast/raw/main/eng.traineddata"));
    }

    #[test]
    fn test_to_bmp_reencodes_png() {
        let mut png = Vec::new();
        RgbaImage::new(4, 3)
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let bmp = to_bmp(&png).unwrap();
        assert_eq!(&bmp[..2], b"BM");
    }

    #[test]
    fn test_to_bmp_rejects_garbage() {
        assert!(matches!(to_bmp(b"not an image"), Err(OcrError::RecognitionError(_))));
    }
}
