//! License plate recognition
//!
//! Finds candidate regions in an image by color, crops and enhances them,
//! runs them through an OCR engine and pulls a plate string out of the text.
//!
//! ```text
//! pixels -> tracker -> [resolver] -> preprocessing -> engine -> plate
//! ```

pub mod config;
pub mod engine;
pub mod engines;
pub mod error;
pub mod geometry;
pub mod pixels;
pub mod plate;
pub mod preprocessing;
pub mod processor;
pub mod resolver;
pub mod server;
pub mod tracker;

pub use engine::{OcrEngine, PageSegMode, RecognizedLine, Recognition};
pub use error::OcrError;
pub use geometry::{ColorRange, Rectangle};
pub use plate::extract_plate;
pub use preprocessing::FilterConfig;
pub use processor::{OcrResult, PlateProcessor, ProcessorOptions};
