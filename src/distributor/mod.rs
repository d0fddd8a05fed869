//! One distribution pass: every registered account is checked against the
//! feed and rewarded for the acceptances found since its checkpoint.
//!
//! Accounts are processed concurrently, optionally bounded by a concurrency
//! cap, and independently: a failing account is reported in the pass result
//! without affecting the others. The pass returns once every account is done.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use crate::feed::{count_qualifying, ActivityFeed, FeedError};
use crate::rewards::{EntityCheckpoint, RewardCatalog, RewardId};
use crate::store::RewardStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EntityError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("Failed to persist progress: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

/// What a successful account update did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProgress {
    pub records_seen: usize,
    pub new_rewards: Vec<RewardId>,
    pub checkpoint: DateTime<Utc>,
}

#[derive(Debug)]
pub struct EntityOutcome {
    pub account_id: String,
    pub result: Result<EntityProgress, EntityError>,
}

#[derive(Debug)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// In completion order.
    pub outcomes: Vec<EntityOutcome>,
}

impl PassReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn rewards_granted(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|p| p.new_rewards.len())
            .sum()
    }

    pub fn outcome(&self, account_id: &str) -> Option<&EntityOutcome> {
        self.outcomes.iter().find(|o| o.account_id == account_id)
    }
}

pub struct Distributor {
    store: Arc<dyn RewardStore>,
    feed: Arc<dyn ActivityFeed>,
    catalog: RewardCatalog,
    concurrency_cap: Option<usize>,
    clock: Arc<dyn Clock>,
}

impl Distributor {
    /// `concurrency_cap` bounds how many accounts are processed at the same
    /// time, `None` processes all of them at once.
    pub fn new(
        store: Arc<dyn RewardStore>,
        feed: Arc<dyn ActivityFeed>,
        catalog: RewardCatalog,
        concurrency_cap: Option<usize>,
    ) -> Self {
        Self {
            store,
            feed,
            catalog,
            concurrency_cap,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fails only if the accounts cannot be listed. Per-account failures are
    /// part of the returned report.
    pub async fn distribute_pass(&self) -> Result<PassReport> {
        let started_at = Utc::now();

        let store = self.store.clone();
        let entities = tokio::task::spawn_blocking(move || store.list_checkpoints())
            .await
            .context("Account listing task failed")?
            .context("Failed to list accounts")?;

        debug!("Starting distribution pass over {} account(s)", entities.len());

        let semaphore = self
            .concurrency_cap
            .map(|cap| Arc::new(Semaphore::new(cap.max(1))));
        let mut units = FuturesUnordered::new();
        for entity in entities {
            let semaphore = semaphore.clone();
            units.push(async move {
                // The semaphore is local to this pass and never closed
                let _permit = match &semaphore {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };
                let account_id = entity.account_id.clone();
                let result = self.process_entity(entity).await;
                EntityOutcome { account_id, result }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(outcome) = units.next().await {
            match &outcome.result {
                Ok(progress) if !progress.new_rewards.is_empty() => info!(
                    "Account {} earned {} reward(s): {:?}",
                    outcome.account_id,
                    progress.new_rewards.len(),
                    progress.new_rewards
                ),
                Ok(_) => {}
                Err(EntityError::Feed(e)) => {
                    warn!("Skipping account {} this pass: {}", outcome.account_id, e)
                }
                Err(e) => warn!("Account {} not updated: {}", outcome.account_id, e),
            }
            outcomes.push(outcome);
        }

        let report = PassReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };
        info!(
            "Distribution pass done: {} account(s) updated, {} failed, {} reward(s) granted",
            report.succeeded(),
            report.failed(),
            report.rewards_granted()
        );
        Ok(report)
    }

    async fn process_entity(&self, entity: EntityCheckpoint) -> Result<EntityProgress, EntityError> {
        // The new checkpoint is the instant the request was issued, not when it completed
        let window_start = self.clock.now();

        let records = self
            .feed
            .fetch_since(&entity.tracker_api_token, entity.checkpoint)
            .await?;

        let new_rewards = {
            let mut rng = rand::rng();
            self.catalog
                .draw_many(&mut rng, count_qualifying(&records))
        };

        let store = self.store.clone();
        let account_id = entity.account_id;
        let rewards = new_rewards.clone();
        tokio::task::spawn_blocking(move || {
            store.commit_checkpoint(&account_id, &rewards, window_start)
        })
        .await
        .context("Commit task failed")
        .and_then(|committed| committed)
        .map_err(EntityError::Persistence)?;

        Ok(EntityProgress {
            records_seen: records.len(),
            new_rewards,
            checkpoint: window_start,
        })
    }
}
