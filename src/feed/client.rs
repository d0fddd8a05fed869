//! HTTP client for the tracker notifications endpoint.

use super::models::ActivityRecord;
use super::{ActivityFeed, FeedError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_FEED_BASE_URL: &str = "https://www.pivotaltracker.com";
pub const NOTIFICATIONS_PATH: &str = "/services/v5/my/notifications";
pub const TOKEN_HEADER: &str = "X-TrackerToken";

/// Longest error body kept in a [`FeedError::Status`].
const MAX_ERROR_BODY_LEN: usize = 512;

pub struct TrackerFeedClient {
    client: reqwest::Client,
    base_url: String,
}

impl TrackerFeedClient {
    /// `base_url` is the tracker host (e.g. "https://www.pivotaltracker.com").
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn notifications_url(&self) -> String {
        format!("{}{}", self.base_url, NOTIFICATIONS_PATH)
    }
}

#[async_trait]
impl ActivityFeed for TrackerFeedClient {
    async fn fetch_since(
        &self,
        credential: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, FeedError> {
        let created_after = since.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        let response = self
            .client
            .get(self.notifications_url())
            .header(TOKEN_HEADER, credential)
            .query(&[("created_after", created_after.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_LEN {
                let mut cut = MAX_ERROR_BODY_LEN;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(FeedError::Status { status, body });
        }

        // Decoded separately so malformed payloads surface as FeedError::Decode
        let bytes = response.bytes().await?;
        let records: Vec<ActivityRecord> = serde_json::from_slice(&bytes)?;
        debug!(
            "Fetched {} notification(s) created after {}",
            records.len(),
            created_after
        );
        Ok(records)
    }
}
