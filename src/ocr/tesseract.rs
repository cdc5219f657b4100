//! Tesseract sidecar OCR provider.
//!
//! The sidecar exposes `POST /recognize` (multipart `file` plus Tesseract
//! parameters) and answers `{ "text": ..., "confidence": ... }`.

use super::{OcrInput, OcrProvider, OcrResult};
use serde::Deserialize;
use tracing::{debug, info};

const CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Treat the image as a single text line.
const PAGE_SEG_MODE: &str = "7";

#[derive(Debug, Deserialize)]
struct SidecarResponse {
    text: String,
    confidence: f64,
}

pub struct TesseractSidecar {
    url: String,
    client: reqwest::Client,
}

impl TesseractSidecar {
    pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl OcrProvider for TesseractSidecar {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, input: &OcrInput) -> anyhow::Result<OcrResult> {
        use reqwest::multipart::{Form, Part};

        info!(
            "TesseractSidecar: sending {} ({} bytes, {})",
            input.filename,
            input.data.len(),
            input.mime
        );

        let part = Part::bytes(input.data.clone())
            .file_name(input.filename.clone())
            .mime_str(&input.mime)?;

        let form = Form::new()
            .part("file", part)
            .text("lang", "eng")
            .text("tessedit_char_whitelist", CHAR_WHITELIST)
            .text("tessedit_pageseg_mode", PAGE_SEG_MODE)
            .text("preserve_interword_spaces", "0");

        let response = self
            .client
            .post(format!("{}/recognize", self.url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Tesseract sidecar error ({}): {}", status, error_text);
        }

        let result: SidecarResponse = response.json().await?;
        debug!(
            "TesseractSidecar: {} chars at confidence {:.1}",
            result.text.len(),
            result.confidence
        );

        Ok(OcrResult {
            text: result.text,
            confidence: result.confidence.clamp(0.0, 100.0),
            provider_name: self.name().to_string(),
        })
    }
}
