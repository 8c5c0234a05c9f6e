//! YouTube Data API search client

use super::traits::{UpstreamError, UpstreamResponse, VideoSearch};
use crate::config::UpstreamSettings;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// HTTP client for the YouTube search endpoint
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    base_url: String,
    api_key: String,
    part: String,
    result_type: String,
}

impl YouTubeClient {
    /// Create a new client from upstream settings
    pub fn with_settings(settings: &UpstreamSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
            part: settings.part.clone(),
            result_type: settings.result_type.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &str) -> Result<UpstreamResponse, UpstreamError> {
        debug!("Upstream search for {:?}", query);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("part", self.part.as_str()),
                ("q", query),
                ("type", self.result_type.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(UpstreamResponse { status, body })
    }
}
