mod sqlite_reward_store;

pub use sqlite_reward_store::SqliteRewardStore;

use crate::rewards::{Entity, EntityCheckpoint, RewardId};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Persistence of tracker accounts, their checkpoints and their rewards.
pub trait RewardStore: Send + Sync {
    /// All registered accounts, ordered by account id.
    fn list_entities(&self) -> Result<Vec<Entity>>;

    /// Checkpoints of all registered accounts, ordered by account id. Unlike
    /// [`RewardStore::list_entities`] this never reads stored rewards, so an
    /// account whose rewards cannot be decoded is still listed.
    fn list_checkpoints(&self) -> Result<Vec<EntityCheckpoint>> {
        Ok(self
            .list_entities()?
            .into_iter()
            .map(EntityCheckpoint::from)
            .collect())
    }

    fn get_entity(&self, account_id: &str) -> Result<Option<Entity>>;

    /// Atomically appends `new_rewards` to the account's rewards and moves its
    /// checkpoint forward to `checkpoint`. A checkpoint older than the stored
    /// one leaves the stored one in place. Fails if the account is unknown, in
    /// which case nothing is written.
    fn commit_checkpoint(
        &self,
        account_id: &str,
        new_rewards: &[RewardId],
        checkpoint: DateTime<Utc>,
    ) -> Result<()>;

    /// Highest fully applied migration, `None` if no migration ever ran.
    fn get_schema_version(&self) -> Result<Option<u64>>;

    fn set_schema_version(&self, version: u64) -> Result<()>;
}
