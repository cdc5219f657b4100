//! OCR collaborator abstraction.
//!
//! The engine is a black box: it takes an image and returns raw text plus a
//! confidence in `[0, 100]`. Backends implement [`OcrProvider`].

pub mod tesseract;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

use crate::error::RecognitionError;

/// Raw engine output.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub text: String,
    pub confidence: f64,
    pub provider_name: String,
}

/// A decoded image ready to hand to an engine.
#[derive(Debug, Clone)]
pub struct OcrInput {
    pub filename: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl OcrInput {
    /// Parse a `data:image/<type>;base64,<payload>` URL.
    pub fn from_data_url(data_url: &str) -> Result<Self, RecognitionError> {
        let rest = data_url
            .strip_prefix("data:image/")
            .ok_or_else(|| RecognitionError::Input("invalid image format".to_string()))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| RecognitionError::Input("malformed data URL".to_string()))?;

        let subtype = header.strip_suffix(";base64").ok_or_else(|| {
            RecognitionError::Input("image data URL must be base64 encoded".to_string())
        })?;

        let data = BASE64
            .decode(payload.trim())
            .map_err(|e| RecognitionError::Input(format!("invalid base64 image: {}", e)))?;

        Self::from_bytes(format!("capture.{}", subtype), data)
    }

    /// Wrap uploaded bytes, rejecting anything that is not a known image
    /// encoding.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Result<Self, RecognitionError> {
        if data.is_empty() {
            return Err(RecognitionError::Input("image not provided".to_string()));
        }

        let format = image::guess_format(&data)
            .map_err(|_| RecognitionError::Input("unrecognized image encoding".to_string()))?;

        Ok(Self {
            filename: filename.into(),
            mime: format.to_mime_type().to_string(),
            data,
        })
    }

    /// Hex SHA-256 of the image bytes, for logs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.data);
        format!("{:x}", hasher.finalize())
    }
}

/// Async trait implemented by each OCR backend.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn recognize(&self, input: &OcrInput) -> anyhow::Result<OcrResult>;
}
