//! Incident lookups through the hosted store's PostgREST gateway.
//!
//! Issues `GET {url}/rest/v1/incidents?select=*&id=eq.{id}` with the project
//! access key in both the `apikey` and `Authorization` headers.

use std::time::Duration;

use async_trait::async_trait;
use resqnet_core::incident::Incident;

use crate::store::{IncidentStore, StoreError, INCIDENTS_TABLE};

/// Connection parameters for the REST gateway.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub base_url: String,
    /// Project access key.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// [`IncidentStore`] backed by the REST gateway.
pub struct PostgrestIncidentStore {
    client: reqwest::Client,
    rest_url: String,
    api_key: String,
}

impl PostgrestIncidentStore {
    /// Build the adapter and its HTTP client.
    pub fn new(config: PostgrestConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.base_url, config.api_key))
    }

    /// Create the adapter reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            api_key,
        }
    }

    fn table_request(&self) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/{INCIDENTS_TABLE}", self.rest_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Return the response unchanged on a 2xx status, or an
    /// [`StoreError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl IncidentStore for PostgrestIncidentStore {
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Incident>, StoreError> {
        let response = self
            .table_request()
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .send()
            .await?;

        let rows: Vec<serde_json::Value> = Self::ensure_success(response).await?.json().await?;

        if rows.len() > 1 {
            return Err(StoreError::Ambiguous {
                id: id.to_string(),
                count: rows.len(),
            });
        }

        let Some(row) = rows.into_iter().next() else {
            tracing::debug!(crisis_id = %id, "No incident row found");
            return Ok(None);
        };

        tracing::debug!(crisis_id = %id, record = %row, "Fetched incident row");
        Ok(Some(serde_json::from_value(row)?))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let response = self
            .table_request()
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
