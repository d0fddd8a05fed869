use chrono::{DateTime, Utc};

/// Identifier of a reward in the catalog, in `1..=catalog size`.
pub type RewardId = u32;

/// A registered tracker account as seen by the reward distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub account_id: String,
    /// Token sent to the tracker feed on behalf of this account.
    pub tracker_api_token: String,
    /// Everything strictly before this instant has already been processed.
    pub checkpoint: DateTime<Utc>,
    /// Rewards awarded so far, in award order.
    pub rewards: Vec<RewardId>,
}

impl Entity {
    /// A freshly registered account: epoch checkpoint, no rewards.
    pub fn new(account_id: impl Into<String>, tracker_api_token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            tracker_api_token: tracker_api_token.into(),
            checkpoint: epoch(),
            rewards: Vec::new(),
        }
    }
}

/// The part of an account a distribution pass works from. Rewards are left
/// out, commits append to whatever is stored at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCheckpoint {
    pub account_id: String,
    pub tracker_api_token: String,
    pub checkpoint: DateTime<Utc>,
}

impl From<Entity> for EntityCheckpoint {
    fn from(entity: Entity) -> Self {
        Self {
            account_id: entity.account_id,
            tracker_api_token: entity.tracker_api_token,
            checkpoint: entity.checkpoint,
        }
    }
}

/// The zero checkpoint used for accounts that were never processed.
pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp_nanos(0)
}
