//! Vehicle-status lookups downstream of a validated plate.
//!
//! Theft, auction, IPVA and fine checks are stand-ins returning fixed
//! values; only the aggregate shape and concurrent fan-out matter. The
//! optional [`ConsultaClient`] proxies to a real external API when a token
//! is configured.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RecognitionError;
use crate::plate::Plate;

const NOT_IDENTIFIED: &str = "Not identified";

/// Validate a manually typed plate before any lookup is attempted.
pub fn validate_manual_entry(input: Option<&str>) -> Result<Plate, RecognitionError> {
    let raw = input.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(RecognitionError::Input("plate not provided".to_string()));
    }
    Plate::parse(raw).ok_or_else(|| RecognitionError::Validation(raw.to_string()))
}

/// Aggregate lookup result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleData {
    pub plate: String,
    pub formatted: String,
    pub brand: String,
    pub model: String,
    pub year: String,
    pub stolen: bool,
    pub auction: bool,
    pub ipva_debt: bool,
    pub fines: bool,
}

/// Registration details; any field may be unknown.
#[derive(Debug, Clone, Default)]
pub struct VehicleInfo {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<String>,
}

/// Mocked status sources.
#[derive(Debug, Clone, Default)]
pub struct VehicleService;

impl VehicleService {
    pub fn new() -> Self {
        Self
    }

    async fn vehicle_info(&self, plate: &Plate) -> VehicleInfo {
        debug!("vehicle_info({})", plate);
        VehicleInfo {
            brand: Some("Volkswagen".to_string()),
            model: Some("Gol".to_string()),
            year: Some("2020".to_string()),
        }
    }

    async fn check_stolen(&self, plate: &Plate) -> bool {
        debug!("check_stolen({})", plate);
        false
    }

    async fn check_auction(&self, plate: &Plate) -> bool {
        debug!("check_auction({})", plate);
        false
    }

    async fn check_ipva_debt(&self, plate: &Plate) -> bool {
        debug!("check_ipva_debt({})", plate);
        false
    }

    async fn check_fines(&self, plate: &Plate) -> bool {
        debug!("check_fines({})", plate);
        false
    }

    /// Run every independent lookup concurrently and merge the results.
    pub async fn lookup(&self, plate: &Plate) -> VehicleData {
        let (info, stolen, auction, ipva_debt, fines) = tokio::join!(
            self.vehicle_info(plate),
            self.check_stolen(plate),
            self.check_auction(plate),
            self.check_ipva_debt(plate),
            self.check_fines(plate),
        );

        info!("Vehicle lookup complete for {}", plate);
        Self::merge(plate, info, stolen, auction, ipva_debt, fines)
    }

    fn merge(
        plate: &Plate,
        info: VehicleInfo,
        stolen: bool,
        auction: bool,
        ipva_debt: bool,
        fines: bool,
    ) -> VehicleData {
        let or_unknown = |v: Option<String>| v.unwrap_or_else(|| NOT_IDENTIFIED.to_string());
        VehicleData {
            plate: plate.as_str().to_string(),
            formatted: plate.hyphenated(),
            brand: or_unknown(info.brand),
            model: or_unknown(info.model),
            year: or_unknown(info.year),
            stolen,
            auction,
            ipva_debt,
            fines,
        }
    }
}

/// Client for the external vehicle registry (`/veiculos/{plate}`).
#[derive(Clone)]
pub struct ConsultaClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ConsultaClient {
    /// `None` unless both URL and token are configured.
    pub fn new(client: reqwest::Client, base_url: Option<&str>, token: Option<&str>) -> Option<Self> {
        Some(Self {
            client,
            base_url: base_url?.trim_end_matches('/').to_string(),
            token: token?.to_string(),
        })
    }

    pub async fn fetch(&self, plate: &Plate) -> Result<serde_json::Value> {
        let url = format!("{}/veiculos/{}", self.base_url, plate.as_str());
        debug!("ConsultaClient: GET {}", url);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to reach vehicle API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vehicle API error ({}): {}", status, text);
        }

        resp.json().await.context("Failed to parse vehicle API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manual_entry_rejects_short_plate() {
        let err = validate_manual_entry(Some("AB1234")).unwrap_err();
        assert!(matches!(err, RecognitionError::Validation(_)));
        assert!(err.to_string().contains("ABC1234"));
        assert!(err.to_string().contains("ABC1D23"));
    }

    #[test]
    fn test_manual_entry_missing() {
        assert!(matches!(
            validate_manual_entry(None).unwrap_err(),
            RecognitionError::Input(_)
        ));
        assert!(matches!(
            validate_manual_entry(Some("   ")).unwrap_err(),
            RecognitionError::Input(_)
        ));
    }

    #[test]
    fn test_manual_entry_accepts_both_formats() {
        assert_eq!(validate_manual_entry(Some(" abc1234 ")).unwrap().as_str(), "ABC1234");
        assert_eq!(validate_manual_entry(Some("abc-1d23")).unwrap().as_str(), "ABC1D23");
    }

    #[tokio::test]
    async fn test_lookup_aggregate_shape() {
        let plate = Plate::parse("ABC1D23").unwrap();
        let data = VehicleService::new().lookup(&plate).await;
        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({
                "plate": "ABC1D23",
                "formatted": "ABC-1D23",
                "brand": "Volkswagen",
                "model": "Gol",
                "year": "2020",
                "stolen": false,
                "auction": false,
                "ipvaDebt": false,
                "fines": false,
            })
        );
    }

    #[test]
    fn test_missing_info_not_identified() {
        let plate = Plate::parse("ABC1234").unwrap();
        let data = VehicleService::merge(&plate, VehicleInfo::default(), true, false, true, false);
        assert_eq!(data.brand, NOT_IDENTIFIED);
        assert_eq!(data.year, NOT_IDENTIFIED);
        assert!(data.stolen && data.ipva_debt);
    }

    #[test]
    fn test_consulta_client_needs_url_and_token() {
        let client = reqwest::Client::new();
        assert!(ConsultaClient::new(client.clone(), Some("http://x"), None).is_none());
        assert!(ConsultaClient::new(client.clone(), None, Some("t")).is_none());
        let c = ConsultaClient::new(client, Some("http://x/"), Some("t")).unwrap();
        assert_eq!(c.base_url, "http://x");
    }
}
