//! Supabase client for the plate query log.
//!
//! Opt-in: without `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY` logging is
//! skipped. Failures are logged and never surface to the caller.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::schema::now_iso8601;

const QUERY_LOGS: &str = "query_logs";

/// One row of `query_logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub plate: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub result_data: serde_json::Value,
}

impl QueryLog {
    pub fn new(plate: &str, result_data: serde_json::Value) -> Self {
        Self {
            id: Some(format!("qry_{}", Uuid::new_v4().simple())),
            plate: plate.to_string(),
            timestamp: now_iso8601(),
            user_id: None,
            result_data,
        }
    }
}

#[derive(Clone)]
pub struct QueryLogClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl QueryLogClient {
    /// Build from environment; `None` (with a warning) when not configured.
    pub fn from_env(client: Client) -> Option<Self> {
        let base_url = std::env::var("SUPABASE_URL").ok().filter(|s| !s.is_empty());
        let key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        match (base_url, key) {
            (Some(base_url), Some(service_role_key)) => Some(Self {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                service_role_key,
            }),
            _ => {
                warn!("Supabase not configured; query logging disabled");
                None
            }
        }
    }

    fn table_url(&self, query: &str) -> String {
        format!("{}/rest/v1/{}{}", self.base_url, QUERY_LOGS, query)
    }

    async fn insert(&self, log: &QueryLog) -> Result<()> {
        let resp = self
            .client
            .post(self.table_url(""))
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(&[log])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to insert query log: {} - {}", status, text));
        }

        Ok(())
    }

    /// Record a lookup. Errors are logged and swallowed.
    pub async fn log_query(&self, plate: &str, result_data: serde_json::Value) -> Option<QueryLog> {
        let log = QueryLog::new(plate, result_data);
        debug!("Inserting query log for {}", plate);

        match self.insert(&log).await {
            Ok(()) => {
                info!("Logged query for {}", plate);
                Some(log)
            }
            Err(e) => {
                error!("Failed to log query for {}: {:#}", plate, e);
                None
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, query: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.table_url(query))
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Supabase GET {} failed: {} - {}", query, status, text));
        }

        Ok(resp.json().await?)
    }

    /// Most recent queries first. Errors yield an empty list.
    pub async fn fetch_history(&self, limit: usize) -> Vec<QueryLog> {
        match self.get_json(&history_query(limit)).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Failed to fetch query history: {:#}", e);
                Vec::new()
            }
        }
    }
}

fn history_query(limit: usize) -> String {
    format!("?select=*&order=timestamp.desc&limit={}", limit)
}
