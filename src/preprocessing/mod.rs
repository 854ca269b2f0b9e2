//! Crop and enhance regions before recognition
//!
//! Provides the crop/filter pipeline and the per-request filter configuration.

pub mod filters;
pub mod pipeline;
pub mod steps;

pub use filters::FilterConfig;
pub use pipeline::{encode_png, Pipeline, PreparedImage, StepTiming};
