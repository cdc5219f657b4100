//! Plate recovery from noisy OCR text.
//!
//! Two strategies are available:
//!
//! - **Multi-pass** (default): direct pattern search over the whole text, then
//!   a global cleanup substitution, then positional coercion with a
//!   confidence penalty. First pass to produce a valid plate wins.
//! - **Line scan**: each line is stripped, its first 7 characters are
//!   coerced by slot, and the first line that validates wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

use super::coercion::{cleanup_substitution, FULL_TEXT_TABLE, LINE_TABLE};
use super::{normalize, Plate, PLATE_LEN};

static RE_MERCOSUL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{3}[0-9][A-Z][0-9]{2}").expect("valid mercosul regex"));
static RE_LEGACY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{3}[0-9]{4}").expect("valid legacy regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStrategy {
    #[default]
    MultiPass,
    LineScan,
}

impl RecoveryStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "multi_pass" => Some(Self::MultiPass),
            "line_scan" => Some(Self::LineScan),
            _ => None,
        }
    }
}

/// Which step produced the plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPass {
    DirectMatch,
    Cleanup,
    Positional,
    LineScan,
}

/// Confidence adjustment applied when positional coercion had to repair
/// the text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionPolicy {
    pub confidence_factor: f64,
}

impl Default for CorrectionPolicy {
    fn default() -> Self {
        Self {
            confidence_factor: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    pub plate: Plate,
    pub pass: RecoveryPass,
    pub confidence: f64,
}

/// Find the first line whose leading 7 characters coerce into a valid plate.
pub fn extract_from_lines(text: &str) -> Option<Plate> {
    for line in text.split('\n') {
        let stripped = normalize(line);
        if stripped.len() < PLATE_LEN {
            continue;
        }

        let candidate: String = LINE_TABLE.coerce(&stripped[..PLATE_LEN]);
        if let Some(plate) = Plate::parse(&candidate) {
            debug!("Line scan: '{}' -> {}", line.trim(), plate);
            return Some(plate);
        }
    }
    None
}

/// Search the stripped text for a plate-shaped run; Mercosul is tried first.
pub fn direct_match(stripped: &str) -> Option<Plate> {
    RE_MERCOSUL
        .find(stripped)
        .or_else(|| RE_LEGACY.find(stripped))
        .and_then(|m| Plate::parse(m.as_str()))
}

fn multi_pass(text: &str, confidence: f64, policy: &CorrectionPolicy) -> Option<Recovered> {
    let stripped = normalize(text);

    if let Some(plate) = direct_match(&stripped) {
        return Some(Recovered {
            plate,
            pass: RecoveryPass::DirectMatch,
            confidence,
        });
    }

    if let Some(plate) = Plate::parse(&cleanup_substitution(&stripped)) {
        return Some(Recovered {
            plate,
            pass: RecoveryPass::Cleanup,
            confidence,
        });
    }

    let coerced = FULL_TEXT_TABLE.coerce(&stripped);
    debug!("Coerced with {} table: {} -> {}", FULL_TEXT_TABLE.name, stripped, coerced);
    Plate::parse(&coerced).map(|plate| Recovered {
        plate,
        pass: RecoveryPass::Positional,
        confidence: confidence * policy.confidence_factor,
    })
}

/// Recover a plate from raw OCR text using the given strategy.
pub fn recover(
    text: &str,
    confidence: f64,
    strategy: RecoveryStrategy,
    policy: &CorrectionPolicy,
) -> Option<Recovered> {
    match strategy {
        RecoveryStrategy::MultiPass => multi_pass(text, confidence, policy),
        RecoveryStrategy::LineScan => extract_from_lines(text).map(|plate| Recovered {
            plate,
            pass: RecoveryPass::LineScan,
            confidence,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::PlateFormat;

    fn multi(text: &str, confidence: f64) -> Option<Recovered> {
        recover(
            text,
            confidence,
            RecoveryStrategy::MultiPass,
            &CorrectionPolicy::default(),
        )
    }

    #[test]
    fn test_line_scan_coerces_confused_glyphs() {
        let plate = extract_from_lines("A0C1O23\n").unwrap();
        assert_eq!(plate.as_str(), "AOC1O23");
        assert_eq!(plate.format(), PlateFormat::Mercosul);
    }

    #[test]
    fn test_line_scan_first_valid_line_wins() {
        let text = "RENAULT\n*** 12 ***\nBRA-2E19\nQRS-1234";
        assert_eq!(extract_from_lines(text).unwrap().as_str(), "BRA2E19");
    }

    #[test]
    fn test_line_scan_only_looks_at_first_seven() {
        // valid plate sits after a noise prefix: line scan does not search
        assert!(extract_from_lines("XXXXABC1234").is_none());
        assert_eq!(
            extract_from_lines("abc 1234 sp").unwrap().as_str(),
            "ABC1234"
        );
    }

    #[test]
    fn test_line_scan_no_long_run() {
        assert!(extract_from_lines("AB 12\nC-3\n\n").is_none());
        assert!(extract_from_lines("").is_none());
    }

    #[test]
    fn test_direct_match_anywhere() {
        let rec = multi("BRASIL\nXABC1D23Y", 80.0).unwrap();
        assert_eq!(rec.plate.as_str(), "ABC1D23");
        assert_eq!(rec.pass, RecoveryPass::DirectMatch);
        assert_eq!(rec.confidence, 80.0);
    }

    #[test]
    fn test_direct_match_prefers_mercosul() {
        let plate = direct_match("ABC1234XYZ9K88").unwrap();
        assert_eq!(plate.as_str(), "XYZ9K88");
    }

    #[test]
    fn test_cleanup_pass() {
        let rec = multi("ABC IO23", 70.0).unwrap();
        assert_eq!(rec.plate.as_str(), "ABC1023");
        assert_eq!(rec.pass, RecoveryPass::Cleanup);
        assert_eq!(rec.confidence, 70.0);
    }

    #[test]
    fn test_positional_pass_scales_confidence() {
        let rec = multi("A0C1O23", 80.0).unwrap();
        assert_eq!(rec.plate.as_str(), "AOC1O23");
        assert_eq!(rec.pass, RecoveryPass::Positional);
        assert!((rec.confidence - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_positional_pass_maps_q_to_zero() {
        let rec = multi("ABC1DQ3", 50.0).unwrap();
        assert_eq!(rec.plate.as_str(), "ABC1D03");
        assert_eq!(rec.pass, RecoveryPass::Positional);
    }

    #[test]
    fn test_direct_match_beats_correctable_candidate() {
        let rec = multi("A0C1O23\nXYZ9876", 60.0).unwrap();
        assert_eq!(rec.plate.as_str(), "XYZ9876");
        assert_eq!(rec.pass, RecoveryPass::DirectMatch);
        assert_eq!(rec.confidence, 60.0);
    }

    #[test]
    fn test_custom_penalty() {
        let policy = CorrectionPolicy {
            confidence_factor: 0.5,
        };
        let rec = recover("A0C1O23", 80.0, RecoveryStrategy::MultiPass, &policy).unwrap();
        assert!((rec.confidence - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_unrecoverable_text() {
        assert!(multi("", 90.0).is_none());
        assert!(multi("HELLO WORLD", 90.0).is_none());
        assert!(multi("77 88", 90.0).is_none());
    }

    #[test]
    fn test_line_scan_strategy_keeps_confidence() {
        let rec = recover(
            "A0C1O23",
            80.0,
            RecoveryStrategy::LineScan,
            &CorrectionPolicy::default(),
        )
        .unwrap();
        assert_eq!(rec.pass, RecoveryPass::LineScan);
        assert_eq!(rec.confidence, 80.0);
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            RecoveryStrategy::from_str("line_scan"),
            Some(RecoveryStrategy::LineScan)
        );
        assert_eq!(RecoveryStrategy::from_str("other"), None);
    }
}
