use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to configure OCR engine: {0}")]
    ConfigurationError(String),

    #[error("Failed to recognize text: {0}")]
    RecognitionError(String),

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Whether the failure came from the recognition engine (load, configure or recognize)
    pub fn is_recognition_failure(&self) -> bool {
        matches!(
            self,
            OcrError::InitializationError(_)
                | OcrError::ConfigurationError(_)
                | OcrError::RecognitionError(_)
        )
    }

    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            OcrError::InitializationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR"),
            OcrError::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            OcrError::RecognitionError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RECOGNITION_ERROR")
            }
            OcrError::PreprocessingError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PREPROCESSING_ERROR")
            }
            OcrError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
            OcrError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            OcrError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            OcrError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            OcrError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let (status, code) = self.code();

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failures_are_recognition_failures() {
        assert!(OcrError::InitializationError("x".into()).is_recognition_failure());
        assert!(OcrError::ConfigurationError("x".into()).is_recognition_failure());
        assert!(OcrError::RecognitionError("x".into()).is_recognition_failure());
        assert!(!OcrError::MissingFile.is_recognition_failure());
    }

    #[test]
    fn test_status_codes() {
        let response = OcrError::ImageTooLarge { size: 10, max: 5 }.into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = OcrError::InvalidRequest("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = OcrError::RecognitionError("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
