//! Wire types returned to the HTTP/UI layer.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::RecognitionError;
use crate::plate::extract::{Recovered, RecoveryPass};
use crate::plate::{Plate, PlateFormat};

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn now_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_unix_secs(secs)
}

fn format_unix_secs(secs: u64) -> String {
    let days = (secs / 86400) as i64;
    let time_of_day = secs % 86400;

    // civil-from-days, proleptic Gregorian
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        day,
        time_of_day / 3600,
        (time_of_day % 3600) / 60,
        time_of_day % 60
    )
}

/// Successful recognition payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedPlate {
    /// Bare 7-character form.
    pub plate: Plate,
    /// Hyphenated display form.
    pub formatted: String,
    pub format: PlateFormat,
    pub confidence: f64,
    pub pass: RecoveryPass,
}

impl From<Recovered> for RecognizedPlate {
    fn from(r: Recovered) -> Self {
        Self {
            formatted: r.plate.hyphenated(),
            format: r.plate.format(),
            plate: r.plate,
            confidence: r.confidence,
            pass: r.pass,
        }
    }
}

/// Terminal result of a recognition request. Serializes as
/// `{ "success": true, ... }` or `{ "success": false, "error": ... }`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    Success(RecognizedPlate),
    Failure { error: String },
}

impl From<&RecognitionError> for RecognitionOutcome {
    fn from(e: &RecognitionError) -> Self {
        Self::Failure {
            error: e.to_string(),
        }
    }
}

#[derive(Serialize)]
struct OutcomeWire<'a> {
    success: bool,
    #[serde(flatten)]
    result: Option<&'a RecognizedPlate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for RecognitionOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Success(result) => OutcomeWire {
                success: true,
                result: Some(result),
                error: None,
            },
            Self::Failure { error } => OutcomeWire {
                success: false,
                result: None,
                error: Some(error),
            },
        };
        wire.serialize(serializer)
    }
}

/// Body of `POST /api/ocr`.
#[derive(Debug, Deserialize)]
pub struct OcrRequest {
    #[serde(default)]
    pub image: Option<String>,
}

/// Body of `POST /api/vehicle`.
#[derive(Debug, Deserialize)]
pub struct PlateRequest {
    #[serde(default)]
    pub plate: Option<String>,
}

/// Generic `{ success, data | error }` envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
