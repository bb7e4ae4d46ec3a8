use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use vigil_core::SessionExtender;

use crate::events::TrackActivityRequest;
use crate::traits::EventTransport;

/// Response body of `POST /api/extend-session`
#[derive(Debug, Deserialize)]
struct ExtendSessionResponse {
    success: bool,
}

/// HTTP client for the activity collector backend
///
/// Covers both endpoints: `/api/track-activity` (telemetry) and
/// `/api/extend-session` (the watchdog's extension side channel).
pub struct CollectorClient {
    base_url: String,
    client: reqwest::Client,
    /// Separate short-timeout client for beacon-style teardown sends
    beacon: reqwest::Client,
}

impl CollectorClient {
    /// Create a new collector client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        let beacon = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .context("Failed to create beacon HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            client,
            beacon,
        })
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn require_success(response: reqwest::Response) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Collector API error ({status}): {body}");
        }
        Ok(response)
    }
}

#[async_trait]
impl EventTransport for CollectorClient {
    async fn deliver(&self, event: &TrackActivityRequest) -> Result<()> {
        let url = self.build_url("api/track-activity");
        log::debug!("POST {url} ({})", event.activity_type);

        let response = self
            .client
            .post(url)
            .json(event)
            .send()
            .await
            .context("Failed to send event to activity collector")?;
        Self::require_success(response).await?;
        Ok(())
    }

    async fn deliver_final(&self, event: &TrackActivityRequest) -> Result<()> {
        let url = self.build_url("api/track-activity");
        log::debug!("POST {url} ({}, beacon)", event.activity_type);

        // Best effort: the response, including its status, is ignored
        self.beacon
            .post(url)
            .json(event)
            .send()
            .await
            .context("Failed to send teardown event to activity collector")?;
        Ok(())
    }
}

#[async_trait]
impl SessionExtender for CollectorClient {
    async fn extend_session(&self) -> Result<bool> {
        let url = self.build_url("api/extend-session");
        log::debug!("POST {url}");

        let response = self
            .client
            .post(url)
            .send()
            .await
            .context("Failed to reach the extend-session endpoint")?;
        let response = Self::require_success(response).await?;

        let parsed: ExtendSessionResponse = response
            .json()
            .await
            .context("Failed to parse extend-session response")?;
        Ok(parsed.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_normalizes_trailing_slash() {
        let client = CollectorClient::new("https://example.com/").unwrap();
        assert_eq!(
            client.build_url("api/track-activity"),
            "https://example.com/api/track-activity"
        );

        let client = CollectorClient::new("https://example.com").unwrap();
        assert_eq!(
            client.build_url("api/extend-session"),
            "https://example.com/api/extend-session"
        );
    }

    #[test]
    fn test_extend_session_response_parses() {
        let parsed: ExtendSessionResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(parsed.success);

        let parsed: ExtendSessionResponse =
            serde_json::from_str(r#"{"success": false, "extra": 1}"#).unwrap();
        assert!(!parsed.success);
    }
}
