//! Failure taxonomy for recognition and manual plate entry.

use axum::http::StatusCode;
use thiserror::Error;

use crate::plate::FORMAT_HINT;

#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Missing or malformed image/plate payload.
    #[error("{0}")]
    Input(String),

    /// OCR produced text but no pass recovered a valid plate.
    #[error("no valid plate found. Try better lighting or enter the plate manually.")]
    Extraction,

    /// The OCR engine itself failed.
    #[error("failed to process the image. Try again or enter the plate manually.")]
    Engine(String),

    /// Manually entered plate does not follow either format.
    #[error("{}", FORMAT_HINT)]
    Validation(String),
}

impl RecognitionError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Input(_) | Self::Extraction | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for RecognitionError {
    fn from(e: anyhow::Error) -> Self {
        Self::Engine(format!("{:#}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            RecognitionError::Validation("AB1234".into()).to_string(),
            "Invalid plate. Use ABC1234 or ABC1D23."
        );
        assert_eq!(
            RecognitionError::Input("image not provided".into()).to_string(),
            "image not provided"
        );
        assert!(RecognitionError::Extraction.to_string().contains("no valid plate found"));
    }

    #[test]
    fn test_engine_detail_not_exposed() {
        let err: RecognitionError = anyhow::anyhow!("sidecar exploded").into();
        assert!(!err.to_string().contains("exploded"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RecognitionError::Extraction.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RecognitionError::Input(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
