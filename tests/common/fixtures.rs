//! Reward database fixtures

use super::constants::*;
use anyhow::Result;
use std::sync::Arc;
use tempfile::TempDir;
use tracker_rewards::{default_migrations, MigrationRunner, SqliteRewardStore};

/// Creates a migrated database file in a fresh temporary directory.
/// Returns (temp_dir, store); the directory must outlive the store.
pub fn create_migrated_store() -> Result<(TempDir, Arc<SqliteRewardStore>)> {
    let dir = TempDir::new()?;
    let store = SqliteRewardStore::new(dir.path().join("rewards.db"))?;
    store.run_migrations(&MigrationRunner::new(default_migrations()))?;
    Ok((dir, Arc::new(store)))
}

/// Same as [`create_migrated_store`], with every account of [`ACCOUNTS`] registered.
pub fn create_store_with_accounts() -> Result<(TempDir, Arc<SqliteRewardStore>)> {
    let (dir, store) = create_migrated_store()?;
    for (account_id, token) in ACCOUNTS {
        store.register_entity(account_id, token)?;
    }
    Ok((dir, store))
}
