//! Access to the tracker activity feed.

mod client;
mod models;

pub use client::{TrackerFeedClient, DEFAULT_FEED_BASE_URL, NOTIFICATIONS_PATH, TOKEN_HEADER};
pub use models::{count_qualifying, ActivityRecord, QUALIFYING_ACTION};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Feed responded with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Feed response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FeedError {
    /// Malformed payload, as opposed to a transport or status failure.
    pub fn is_decode(&self) -> bool {
        matches!(self, FeedError::Decode(_))
    }
}

#[async_trait]
pub trait ActivityFeed: Send + Sync {
    /// Activity of the account owning `credential` created at or after `since`.
    async fn fetch_since(
        &self,
        credential: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ActivityRecord>, FeedError>;
}
