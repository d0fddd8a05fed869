//! Tracker Rewards Library
//!
//! Polls a task tracker's notification feed for every registered account and
//! awards a random reward for each accepted story, checkpointing progress in
//! SQLite so restarts neither lose nor repeat work.

pub mod config;
pub mod distributor;
pub mod feed;
pub mod migrations;
pub mod rewards;
pub mod scheduler;
pub mod sqlite_persistence;
pub mod store;

// Re-export commonly used types for convenience
pub use distributor::{Distributor, PassReport};
pub use feed::{ActivityFeed, TrackerFeedClient};
pub use migrations::{default_migrations, MigrationRunner};
pub use rewards::RewardCatalog;
pub use scheduler::PollScheduler;
pub use store::{RewardStore, SqliteRewardStore};
