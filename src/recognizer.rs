//! Recognition orchestrator: input guard, OCR, plate recovery, outcome.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::RecognitionError;
use crate::ocr::{OcrInput, OcrProvider};
use crate::plate::extract::{self, CorrectionPolicy, RecoveryStrategy};
use crate::schema::{RecognitionOutcome, RecognizedPlate};

/// Stateless across calls; clone freely and run requests in parallel.
#[derive(Clone)]
pub struct Recognizer {
    provider: Arc<dyn OcrProvider>,
    strategy: RecoveryStrategy,
    policy: CorrectionPolicy,
}

impl Recognizer {
    pub fn new(
        provider: Arc<dyn OcrProvider>,
        strategy: RecoveryStrategy,
        policy: CorrectionPolicy,
    ) -> Self {
        Self {
            provider,
            strategy,
            policy,
        }
    }

    /// Recognize a plate from a `data:image/...` URL.
    pub async fn try_recognize_data_url(
        &self,
        data_url: Option<&str>,
    ) -> Result<RecognizedPlate, RecognitionError> {
        let url = data_url
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RecognitionError::Input("image not provided".to_string()))?;
        let input = OcrInput::from_data_url(url)?;
        self.try_recognize(&input).await
    }

    /// Recognize a plate from an already decoded image. The error kind is
    /// kept so callers can pick a status code; [`Recognizer::into_outcome`]
    /// turns the result into the wire outcome.
    pub async fn try_recognize(
        &self,
        input: &OcrInput,
    ) -> Result<RecognizedPlate, RecognitionError> {
        info!(
            "Recognizing {} ({} bytes, sha256={}) with provider={}",
            input.filename,
            input.data.len(),
            input.digest(),
            self.provider.name()
        );

        let ocr = self.provider.recognize(input).await.map_err(|e| {
            warn!("OCR engine failed: {:#}", e);
            RecognitionError::from(e)
        })?;

        debug!(
            "OCR raw text from {}: {:?} (confidence {:.1})",
            ocr.provider_name, ocr.text, ocr.confidence
        );

        let recovered = extract::recover(&ocr.text, ocr.confidence, self.strategy, &self.policy)
            .ok_or(RecognitionError::Extraction)?;

        info!(
            "Plate {} recovered by {:?} (confidence {:.1})",
            recovered.plate, recovered.pass, recovered.confidence
        );

        Ok(recovered.into())
    }

    pub fn into_outcome(result: Result<RecognizedPlate, RecognitionError>) -> RecognitionOutcome {
        match result {
            Ok(plate) => RecognitionOutcome::Success(plate),
            Err(e) => {
                info!("Recognition failed: {:?}", e);
                RecognitionOutcome::from(&e)
            }
        }
    }
}
