//! Detailed vehicle report for the results page.
//!
//! The report is fetched from `{VEHICLE_REPORT_URL}/vehicle/{plate}`. When no
//! URL is configured, or the upstream fails in any way, a demonstration
//! report is generated instead. The generated report is derived from the
//! plate's SHA-256 so the same plate always yields the same report.
//!
//! Field names on the wire follow the upstream contract (`placa`, `multas`,
//! `rouboFurto`, ...).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::plate::Plate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IpvaStatus {
    #[serde(rename = "pago")]
    Paid,
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "isento")]
    Exempt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ipva {
    pub status: IpvaStatus,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "vencimento")]
    pub due_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicensingStatus {
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "vencido")]
    Expired,
    #[serde(rename = "pendente")]
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Licensing {
    pub status: LicensingStatus,
    #[serde(rename = "vencimento")]
    pub due_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineDetail {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "infracao")]
    pub infraction: String,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "pontos")]
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fines {
    #[serde(rename = "quantidade")]
    pub count: u32,
    #[serde(rename = "valorTotal")]
    pub total: f64,
    #[serde(rename = "detalhes", default)]
    pub details: Vec<FineDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Standing {
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "irregular")]
    Irregular,
    #[serde(rename = "bloqueado")]
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TheftStatus {
    #[serde(rename = "limpo")]
    Clean,
    #[serde(rename = "registrado")]
    Reported,
    #[serde(rename = "recuperado")]
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheftRecord {
    pub status: TheftStatus,
    #[serde(rename = "dataOcorrencia", default, skip_serializing_if = "Option::is_none")]
    pub occurred_on: Option<String>,
    #[serde(rename = "boletim", default, skip_serializing_if = "Option::is_none")]
    pub police_report: Option<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRecord {
    #[serde(rename = "passouPorLeilao")]
    pub auctioned: bool,
    #[serde(rename = "dataLeilao", default, skip_serializing_if = "Option::is_none")]
    pub auction_date: Option<String>,
    #[serde(rename = "leiloeiro", default, skip_serializing_if = "Option::is_none")]
    pub auctioneer: Option<String>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Full registration and status report for one plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleReport {
    #[serde(rename = "placa")]
    pub plate: String,
    #[serde(rename = "modelo")]
    pub model: String,
    #[serde(rename = "marca")]
    pub brand: String,
    #[serde(rename = "ano")]
    pub year: u16,
    #[serde(rename = "cor")]
    pub color: String,
    #[serde(rename = "chassi")]
    pub chassis: String,
    pub renavam: String,
    pub ipva: Ipva,
    #[serde(rename = "licenciamento")]
    pub licensing: Licensing,
    #[serde(rename = "multas")]
    pub fines: Fines,
    #[serde(rename = "restricoes", default)]
    pub restrictions: Vec<String>,
    #[serde(rename = "situacao")]
    pub standing: Standing,
    #[serde(rename = "rouboFurto")]
    pub theft: TheftRecord,
    #[serde(rename = "leilao")]
    pub auction: AuctionRecord,
}

/// Deterministic stand-in report keyed on the plate.
pub fn demo_report(plate: &Plate) -> VehicleReport {
    let digest = Sha256::digest(plate.as_str().as_bytes());
    let roll = |i: usize| f64::from(digest[i]) / 255.0;

    let stolen = roll(0) > 0.85;
    let auctioned = roll(1) > 0.75;
    let fine_count = u32::from(digest[4] % 5);

    let details = [
        FineDetail {
            date: "2024-01-15".to_string(),
            infraction: "Speeding".to_string(),
            amount: 195.23,
            points: 5,
        },
        FineDetail {
            date: "2024-02-20".to_string(),
            infraction: "Illegal parking".to_string(),
            amount: 130.16,
            points: 3,
        },
    ];

    VehicleReport {
        plate: plate.as_str().to_string(),
        model: "CIVIC".to_string(),
        brand: "HONDA".to_string(),
        year: 2022,
        color: "PRATA".to_string(),
        chassis: "93HGJ8150MZ******".to_string(),
        renavam: "00123456789".to_string(),
        ipva: Ipva {
            status: if roll(2) > 0.5 {
                IpvaStatus::Paid
            } else {
                IpvaStatus::Pending
            },
            amount: 2450.00,
            due_date: "2024-03-31".to_string(),
        },
        licensing: Licensing {
            status: if roll(3) > 0.3 {
                LicensingStatus::Regular
            } else {
                LicensingStatus::Expired
            },
            due_date: "2024-12-31".to_string(),
        },
        fines: Fines {
            count: fine_count,
            total: (roll(5) * 100_000.0).round() / 100.0,
            details: details.into_iter().take(fine_count as usize).collect(),
        },
        restrictions: if roll(6) > 0.7 {
            vec!["Alienação Fiduciária".to_string()]
        } else {
            Vec::new()
        },
        standing: if roll(7) > 0.8 {
            Standing::Irregular
        } else {
            Standing::Regular
        },
        theft: if stolen {
            TheftRecord {
                status: TheftStatus::Reported,
                occurred_on: Some("2023-08-15".to_string()),
                police_report: Some("BO-2023-08-15-001234".to_string()),
                notes: Some("Vehicle reported stolen on 2023-08-15. Do not buy.".to_string()),
            }
        } else {
            TheftRecord {
                status: TheftStatus::Clean,
                occurred_on: None,
                police_report: None,
                notes: None,
            }
        },
        auction: if auctioned {
            AuctionRecord {
                auctioned: true,
                auction_date: Some("2021-05-20".to_string()),
                auctioneer: Some("Leiloeiro Oficial SP".to_string()),
                notes: Some("Bought at public auction. Paperwork regularized.".to_string()),
            }
        } else {
            AuctionRecord {
                auctioned: false,
                auction_date: None,
                auctioneer: None,
                notes: None,
            }
        },
    }
}

/// Upstream report source with a demonstration fallback.
#[derive(Clone)]
pub struct ReportClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl ReportClient {
    pub fn new(client: reqwest::Client, base_url: Option<&str>) -> Self {
        Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    async fn fetch(&self, base_url: &str, plate: &Plate) -> Result<VehicleReport> {
        let url = format!("{}/vehicle/{}", base_url, plate.as_str());
        debug!("ReportClient: GET {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to reach vehicle report API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Vehicle report API error ({}): {}", status, text);
        }

        resp.json()
            .await
            .context("Failed to parse vehicle report")
    }

    /// Upstream report, or the demonstration report on any failure.
    pub async fn report(&self, plate: &Plate) -> VehicleReport {
        let Some(base_url) = self.base_url.as_deref() else {
            debug!("No report API configured; demo report for {}", plate);
            return demo_report(plate);
        };

        match self.fetch(base_url, plate).await {
            Ok(report) => {
                info!("Vehicle report for {} fetched from upstream", plate);
                report
            }
            Err(e) => {
                warn!("Vehicle report for {} failed, using demo data: {:#}", plate, e);
                demo_report(plate)
            }
        }
    }
}
