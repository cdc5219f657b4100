//! Brazilian plate grammar: validation, canonical form, and presentation.
//!
//! Two formats are recognised, both 7 characters once punctuation is removed:
//! Mercosul (`LLL D X DD`, index 4 letter or digit) and Legacy (`LLL DDDD`).
//! Internally a plate is always the bare 7-character form; the hyphen is
//! added on demand for display.

pub mod coercion;
pub mod extract;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a plate with punctuation removed.
pub const PLATE_LEN: usize = 7;

/// Message shown when manual input does not follow either format.
pub const FORMAT_HINT: &str = "Invalid plate. Use ABC1234 or ABC1D23.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateFormat {
    Mercosul,
    Legacy,
    Invalid,
}

/// Result of checking an arbitrary string against the plate grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub format: PlateFormat,
    /// Hyphenated when valid, otherwise the stripped input.
    pub normalized: String,
}

/// Uppercase and drop everything outside `[A-Z0-9]`.
pub fn normalize(input: &str) -> String {
    input
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Classify a string that is already normalized. Never fails.
pub fn classify(normalized: &str) -> PlateFormat {
    let bytes = normalized.as_bytes();
    if bytes.len() != PLATE_LEN {
        return PlateFormat::Invalid;
    }

    let letters = bytes[..3].iter().all(u8::is_ascii_uppercase);
    let digits = bytes[3].is_ascii_digit() && bytes[5..].iter().all(u8::is_ascii_digit);
    if !(letters && digits) {
        return PlateFormat::Invalid;
    }

    match bytes[4] {
        b if b.is_ascii_uppercase() => PlateFormat::Mercosul,
        b if b.is_ascii_digit() => PlateFormat::Legacy,
        _ => PlateFormat::Invalid,
    }
}

/// Validate any string against the two plate formats.
pub fn validate(input: &str) -> ValidationResult {
    let normalized = normalize(input);
    let format = classify(&normalized);

    match format {
        PlateFormat::Invalid => ValidationResult {
            is_valid: false,
            format,
            normalized,
        },
        _ => ValidationResult {
            is_valid: true,
            format,
            normalized: hyphenate(&normalized),
        },
    }
}

fn hyphenate(bare: &str) -> String {
    format!("{}-{}", &bare[..3], &bare[3..])
}

/// A plate that has passed validation, stored without the hyphen.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Plate {
    bare: String,
    format: PlateFormat,
}

impl Plate {
    /// Parse any string; `None` unless it normalizes to a valid plate.
    pub fn parse(input: &str) -> Option<Self> {
        Self::try_from(validate(input)).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.bare
    }

    pub fn format(&self) -> PlateFormat {
        self.format
    }

    /// `ABC-1D23` / `ABC-1234`.
    pub fn hyphenated(&self) -> String {
        hyphenate(&self.bare)
    }
}

impl TryFrom<ValidationResult> for Plate {
    type Error = ValidationResult;

    fn try_from(result: ValidationResult) -> Result<Self, Self::Error> {
        if !result.is_valid {
            return Err(result);
        }
        let bare: String = result.normalized.chars().filter(|c| *c != '-').collect();
        Ok(Self {
            bare,
            format: result.format,
        })
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hyphenate(&self.bare))
    }
}

impl Serialize for Plate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.bare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercosul_lowercase_input() {
        let result = validate("abc1d23");
        assert!(result.is_valid);
        assert_eq!(result.format, PlateFormat::Mercosul);
        assert_eq!(result.normalized, "ABC-1D23");
    }

    #[test]
    fn test_legacy_plate() {
        let result = validate("ABC1234");
        assert!(result.is_valid);
        assert_eq!(result.format, PlateFormat::Legacy);
        assert_eq!(result.normalized, "ABC-1234");
    }

    #[test]
    fn test_wrong_shape_is_stripped_only() {
        let result = validate("ABCD123");
        assert!(!result.is_valid);
        assert_eq!(result.format, PlateFormat::Invalid);
        assert_eq!(result.normalized, "ABCD123");

        let result = validate(" ab-cd.12 ");
        assert_eq!(result.normalized, "ABCD12");
    }

    #[test]
    fn test_punctuation_and_spaces_ignored() {
        assert_eq!(validate("abc-1d23").normalized, "ABC-1D23");
        assert_eq!(validate(" ABC 1234\n").normalized, "ABC-1234");
    }

    #[test]
    fn test_validate_is_total() {
        for input in ["", "-", "ÁBC1234", "🚗🚗🚗", "ABC12345", "123ABCD", "ABC1D2"] {
            let result = validate(input);
            assert_eq!(result.is_valid, result.format != PlateFormat::Invalid);
        }
        // non-ASCII letters are dropped, not uppercased into the plate
        assert_eq!(validate("ÁBC1234").normalized, "BC1234");
    }

    #[test]
    fn test_uppercase_folds_into_ascii() {
        // dotless i and long s uppercase to ASCII letters and are kept
        assert_eq!(normalize("ıſ1"), "IS1");
        let result = validate("abc1dıı");
        assert!(!result.is_valid);
        let result = validate("ſbc1234");
        assert!(result.is_valid);
        assert_eq!(result.normalized, "SBC-1234");
        assert_eq!(normalize("straße"), "STRASSE");
    }

    #[test]
    fn test_idempotent_under_normalization() {
        for input in ["abc1d23", "a.b.c-1234", "xyz 9k88", "nope", "AB1234"] {
            assert_eq!(validate(&normalize(input)), validate(input));
        }
    }

    #[test]
    fn test_hyphen_round_trip() {
        for plate in ["abc1234", "QWE9R87", "zzz0000"] {
            let normalized = validate(plate).normalized;
            assert_eq!(normalized.replace('-', ""), plate.to_uppercase());
        }
    }

    #[test]
    fn test_plate_parse_and_display() {
        let plate = Plate::parse("abc-1d23").unwrap();
        assert_eq!(plate.as_str(), "ABC1D23");
        assert_eq!(plate.hyphenated(), "ABC-1D23");
        assert_eq!(plate.to_string(), "ABC-1D23");
        assert_eq!(plate.format(), PlateFormat::Mercosul);
        assert!(Plate::parse("AB1234").is_none());
    }

    #[test]
    fn test_plate_from_validation_result() {
        let plate = Plate::try_from(validate("ABC1234")).unwrap();
        assert_eq!(plate.as_str(), "ABC1234");
        assert_eq!(plate.format(), PlateFormat::Legacy);

        let rejected = Plate::try_from(validate("ABCD123")).unwrap_err();
        assert_eq!(rejected.format, PlateFormat::Invalid);
    }

    #[test]
    fn test_plate_serializes_bare() {
        let plate = Plate::parse("ABC-1234").unwrap();
        assert_eq!(serde_json::to_string(&plate).unwrap(), "\"ABC1234\"");
    }
}
