//! Recognition adapter contract
//!
//! An [`OcrEngine`] is a factory: every pipeline run loads its own
//! [`EngineSession`], configured with the character whitelist and page
//! segmentation mode, and the [`SessionGuard`] releases it exactly once when
//! the run ends, whether it succeeded or not.

use crate::error::OcrError;
use serde::{Deserialize, Serialize};

/// Digits plus all 26 Latin letters, the whitelist the earlier plate reader shipped
pub const DEFAULT_CHAR_WHITELIST: &str = "0123456789QWERTYUIOPASDFGHJKLZXCVBNM";

/// Expected layout of the text inside a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageSegMode {
    /// A uniform block of text, possibly several lines
    #[default]
    SingleBlock,
    /// Exactly one line of text
    SingleLine,
}

impl PageSegMode {
    /// Tesseract `tessedit_pageseg_mode` value
    pub fn tesseract_value(&self) -> &'static str {
        match self {
            Self::SingleBlock => "6",
            Self::SingleLine => "7",
        }
    }
}

/// Per-session engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub char_whitelist: String,
    pub page_seg_mode: PageSegMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            char_whitelist: DEFAULT_CHAR_WHITELIST.to_string(),
            page_seg_mode: PageSegMode::default(),
        }
    }
}

impl EngineSettings {
    /// Drop every character the whitelist does not allow, keeping whitespace
    pub fn retain_allowed(&self, text: &str) -> String {
        text.chars()
            .filter(|c| c.is_whitespace() || self.char_whitelist.contains(*c))
            .collect()
    }
}

/// One line of recognized text; `raw` is exactly what the engine produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecognizedLine {
    pub text: String,
    pub raw: String,
}

impl RecognizedLine {
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            text: raw.trim().to_string(),
            raw,
        }
    }
}

/// Output of one recognize call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recognition {
    pub text: String,
    pub lines: Vec<RecognizedLine>,
}

impl Recognition {
    /// Split engine output into non-blank lines
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let lines = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(RecognizedLine::from_raw)
            .collect();
        Self { text, lines }
    }
}

/// Trait that all OCR engines must implement
pub trait OcrEngine: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Load and configure a fresh engine instance
    ///
    /// Load failures are `InitializationError`, rejected settings are
    /// `ConfigurationError`.
    fn load(&self, settings: &EngineSettings) -> Result<Box<dyn EngineSession>, OcrError>;
}

/// A loaded, configured engine instance owned by a single pipeline run
pub trait EngineSession {
    /// Recognize text in an encoded still image
    fn recognize(&mut self, image: &[u8]) -> Result<Recognition, OcrError>;

    /// Tear the instance down
    fn release(self: Box<Self>);
}

/// Scoped ownership of an [`EngineSession`]; releases it on drop
pub struct SessionGuard {
    session: Option<Box<dyn EngineSession>>,
    engine: &'static str,
}

impl SessionGuard {
    pub fn acquire(engine: &dyn OcrEngine, settings: &EngineSettings) -> Result<Self, OcrError> {
        tracing::debug!(
            "Loading {} session (psm: {:?})",
            engine.name(),
            settings.page_seg_mode
        );
        let session = engine.load(settings)?;
        Ok(Self {
            session: Some(session),
            engine: engine.name(),
        })
    }

    pub fn recognize(&mut self, image: &[u8]) -> Result<Recognition, OcrError> {
        match self.session.as_mut() {
            Some(session) => session.recognize(image),
            None => Err(OcrError::Internal(format!(
                "{} session already released",
                self.engine
            ))),
        }
    }

    /// Release now instead of at end of scope
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(session) = self.session.take() {
            session.release();
            tracing::debug!("Released {} session", self.engine);
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}
