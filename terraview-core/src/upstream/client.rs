//! Upstream sensor-data API client
//!
//! Pure request/response HTTP client, no state. Failures never propagate past
//! the fetch boundary: callers receive an empty list or `None` and the cause
//! is logged here. Retry cadence is owned entirely by the poll timer above.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::models::{AccountId, Reading, Terrarium, TerrariumId};

use super::types::ViewerAccount;

/// Source of terrarium lists and readings, as seen by connection sessions.
///
/// Both operations are best-effort by contract: implementations must degrade
/// to an empty list / `None` rather than raising, so callers are structurally
/// forced to handle the empty case.
#[async_trait]
pub trait ReadingSource: Send + Sync {
    /// Fetch the terrariums tracked by the given account.
    async fn fetch_viewer_terrariums(&self, account_id: AccountId) -> Vec<Terrarium>;

    /// Fetch the latest reading for the given terrarium, if one exists.
    async fn fetch_latest_reading(&self, terrarium_id: TerrariumId) -> Option<Reading>;
}

/// HTTP client for the upstream sensor-data REST API
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base_url: String,
    client: Client,
}

impl UpstreamClient {
    /// Create a new upstream client from configuration
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get current base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn try_fetch_viewer_terrariums(&self, account_id: AccountId) -> Result<Vec<Terrarium>> {
        let url = format!("{}/users/{}", self.base_url, account_id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "GET {url} returned {status}"
            )));
        }

        let account: ViewerAccount = response.json().await?;
        Ok(account.terrarium_data)
    }

    async fn try_fetch_latest_reading(&self, terrarium_id: TerrariumId) -> Result<Reading> {
        let url = format!("{}/readings/t/{}", self.base_url, terrarium_id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "GET {url} returned {status}"
            )));
        }

        let reading: Reading = response.json().await?;
        Ok(reading)
    }
}

#[async_trait]
impl ReadingSource for UpstreamClient {
    async fn fetch_viewer_terrariums(&self, account_id: AccountId) -> Vec<Terrarium> {
        match self.try_fetch_viewer_terrariums(account_id).await {
            Ok(terrariums) => terrariums,
            Err(e) => {
                warn!(
                    account_id = %account_id,
                    error = %e,
                    "Failed to fetch viewer terrariums, continuing with empty set"
                );
                Vec::new()
            }
        }
    }

    async fn fetch_latest_reading(&self, terrarium_id: TerrariumId) -> Option<Reading> {
        match self.try_fetch_latest_reading(terrarium_id).await {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!(
                    terrarium_id = %terrarium_id,
                    error = %e,
                    "Failed to fetch latest reading, skipping this cycle"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> UpstreamClient {
        UpstreamClient::new(&UpstreamConfig {
            base_url: server.uri(),
            request_timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_viewer_terrariums() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "username": "keeper",
                "password_hash": "x",
                "terrariumData": [
                    {"id": 1, "name": "A"},
                    {"id": 2, "name": "B"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let terrariums = client.fetch_viewer_terrariums(AccountId(1)).await;

        assert_eq!(terrariums.len(), 2);
        assert_eq!(terrariums[0].name, "A");
        assert_eq!(terrariums[1].id, TerrariumId(2));
    }

    #[tokio::test]
    async fn test_fetch_terrariums_degrades_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.fetch_viewer_terrariums(AccountId(1)).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_terrariums_degrades_on_connection_error() {
        // Nothing listening on this address
        let client = UpstreamClient::new(&UpstreamConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_seconds: 1,
        })
        .unwrap();

        assert!(client.fetch_viewer_terrariums(AccountId(1)).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_latest_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/readings/t/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 99,
                "date": "2026-03-01T12:00:00Z",
                "temperature": 24.0,
                "humidity": 60.5,
                "terrarium_id": 3
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reading = client.fetch_latest_reading(TerrariumId(3)).await.unwrap();

        assert_eq!(reading.id, 99);
        assert_eq!(reading.terrarium_id, TerrariumId(3));
    }

    #[tokio::test]
    async fn test_fetch_reading_absent_on_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/readings/t/3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.fetch_latest_reading(TerrariumId(3)).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_reading_absent_on_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/readings/t/3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"unexpected": "shape"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.fetch_latest_reading(TerrariumId(3)).await.is_none());
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_trimmed() {
        let client = UpstreamClient::new(&UpstreamConfig {
            base_url: "http://localhost:8081/".to_string(),
            request_timeout_seconds: 5,
        })
        .unwrap();

        assert_eq!(client.base_url(), "http://localhost:8081");
    }
}
