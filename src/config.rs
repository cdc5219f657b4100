//! Service configuration.
//!
//! Defaults, optionally replaced by a JSON file named in
//! `PLATE_LOOKUP_CONFIG`, then overridden field by field from the
//! environment (`.env` is loaded first by `main`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::plate::extract::{CorrectionPolicy, RecoveryStrategy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub body_limit_bytes: usize,
    pub ocr_sidecar_url: String,
    pub recovery_strategy: RecoveryStrategy,
    pub correction: CorrectionPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_api_url: Option<String>,
    #[serde(skip_serializing)]
    pub vehicle_api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_report_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            body_limit_bytes: 10 * 1024 * 1024,
            ocr_sidecar_url: "http://localhost:8884".to_string(),
            recovery_strategy: RecoveryStrategy::default(),
            correction: CorrectionPolicy::default(),
            vehicle_api_url: None,
            vehicle_api_token: None,
            vehicle_report_url: None,
        }
    }
}

impl AppConfig {
    /// Load from `PLATE_LOOKUP_CONFIG` (if set) and the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("PLATE_LOOKUP_CONFIG") {
            Ok(path) => Self::load_from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Override fields from `lookup(VAR)`; empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = var("BODY_LIMIT_BYTES") {
            self.body_limit_bytes = v
                .trim()
                .parse()
                .with_context(|| format!("BODY_LIMIT_BYTES is not a number: {}", v))?;
        }
        if let Some(v) = var("OCR_SIDECAR_URL") {
            self.ocr_sidecar_url = v;
        }
        if let Some(v) = var("PLATE_RECOVERY_STRATEGY") {
            self.recovery_strategy = RecoveryStrategy::from_str(v.trim()).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown PLATE_RECOVERY_STRATEGY: {} (expected multi_pass or line_scan)",
                    v
                )
            })?;
        }
        if let Some(v) = var("CORRECTION_CONFIDENCE_FACTOR") {
            self.correction.confidence_factor = v
                .trim()
                .parse()
                .with_context(|| format!("CORRECTION_CONFIDENCE_FACTOR is not a number: {}", v))?;
        }
        if let Some(v) = var("VEHICLE_API_URL") {
            self.vehicle_api_url = Some(v);
        }
        if let Some(v) = var("VEHICLE_API_TOKEN") {
            self.vehicle_api_token = Some(v);
        }
        if let Some(v) = var("VEHICLE_REPORT_URL") {
            self.vehicle_report_url = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let factor = self.correction.confidence_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            anyhow::bail!("Correction confidence factor must be in (0, 1], got {}", factor);
        }
        if self.body_limit_bytes == 0 {
            anyhow::bail!("Body limit must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.recovery_strategy, RecoveryStrategy::MultiPass);
        assert_eq!(config.correction.confidence_factor, 0.9);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("BIND_ADDR", "127.0.0.1:8080"),
                ("PLATE_RECOVERY_STRATEGY", "line_scan"),
                ("CORRECTION_CONFIDENCE_FACTOR", "0.75"),
                ("VEHICLE_API_TOKEN", "secret"),
                ("VEHICLE_REPORT_URL", "http://localhost:3001/api"),
                ("OCR_SIDECAR_URL", ""),
            ]))
            .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.recovery_strategy, RecoveryStrategy::LineScan);
        assert_eq!(config.correction.confidence_factor, 0.75);
        assert_eq!(config.vehicle_api_token.as_deref(), Some("secret"));
        assert_eq!(
            config.vehicle_report_url.as_deref(),
            Some("http://localhost:3001/api")
        );
        assert_eq!(config.ocr_sidecar_url, "http://localhost:8884");
    }

    #[test]
    fn test_bad_overrides() {
        let mut config = AppConfig::default();
        assert!(config
            .apply_overrides(env(&[("PLATE_RECOVERY_STRATEGY", "guess")]))
            .is_err());
        assert!(config
            .apply_overrides(env(&[("BODY_LIMIT_BYTES", "lots")]))
            .is_err());
    }

    #[test]
    fn test_factor_out_of_range() {
        let mut config = AppConfig::default();
        config.correction.confidence_factor = 1.5;
        assert!(config.validate().is_err());
        config.correction.confidence_factor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_file() {
        let path = std::env::temp_dir().join(format!("plate_lookup_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{ "recovery_strategy": "line_scan", "correction": { "confidence_factor": 0.8 } }"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.recovery_strategy, RecoveryStrategy::LineScan);
        assert_eq!(config.correction.confidence_factor, 0.8);
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_missing_file() {
        assert!(AppConfig::load_from_file(Path::new("/nonexistent/plate.json")).is_err());
    }
}
