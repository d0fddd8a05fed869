use super::RewardStore;
use crate::migrations::{self, MigrationReport, MigrationRunner};
use crate::rewards::{Entity, EntityCheckpoint, RewardId};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const ENTITY_COLUMNS: &str = "account_id, tracker_api_token, checkpoint_nanos, rewards";

pub struct SqliteRewardStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRewardStore {
    /// Opens (or creates) the database file. The schema is not touched, call
    /// [`SqliteRewardStore::run_migrations`] before using the store.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        if !path.exists() {
            info!("Creating new reward database at {:?}", path);
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open reward database at {:?}", path))?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Reward database connection mutex poisoned"))
    }

    pub fn run_migrations(&self, runner: &MigrationRunner) -> Result<MigrationReport> {
        let conn = self.lock()?;
        Ok(runner.run(&conn)?)
    }

    /// Registers a new account with an epoch checkpoint and no rewards.
    pub fn register_entity(&self, account_id: &str, tracker_api_token: &str) -> Result<Entity> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO entities (account_id, tracker_api_token, created_at) VALUES (?1, ?2, ?3)",
            params![account_id, tracker_api_token, Utc::now().timestamp()],
        )
        .with_context(|| format!("Failed to register account {}", account_id))?;
        debug!("Registered account {}", account_id);
        Ok(Entity::new(account_id, tracker_api_token))
    }

    /// Returns false if the account does not exist.
    pub fn update_entity_credential(
        &self,
        account_id: &str,
        tracker_api_token: &str,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE entities SET tracker_api_token = ?1 WHERE account_id = ?2",
            params![tracker_api_token, account_id],
        )?;
        Ok(updated > 0)
    }

    /// Returns false if the account does not exist.
    pub fn remove_entity(&self, account_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM entities WHERE account_id = ?1",
            params![account_id],
        )?;
        Ok(deleted > 0)
    }

    fn row_to_entity(row: &rusqlite::Row) -> rusqlite::Result<Entity> {
        let raw_rewards: String = row.get("rewards")?;
        let rewards = serde_json::from_str(&raw_rewards)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        Ok(Entity {
            account_id: row.get("account_id")?,
            tracker_api_token: row.get("tracker_api_token")?,
            checkpoint: DateTime::from_timestamp_nanos(row.get("checkpoint_nanos")?),
            rewards,
        })
    }

    fn checkpoint_to_nanos(checkpoint: DateTime<Utc>) -> Result<i64> {
        checkpoint
            .timestamp_nanos_opt()
            .with_context(|| format!("Checkpoint {} is out of storable range", checkpoint))
    }
}

impl RewardStore for SqliteRewardStore {
    fn list_entities(&self) -> Result<Vec<Entity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM entities ORDER BY account_id",
            ENTITY_COLUMNS
        ))?;
        let entities = stmt
            .query_map([], Self::row_to_entity)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entities)
    }

    fn list_checkpoints(&self) -> Result<Vec<EntityCheckpoint>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT account_id, tracker_api_token, checkpoint_nanos FROM entities ORDER BY account_id",
        )?;
        let checkpoints = stmt
            .query_map([], |row| {
                Ok(EntityCheckpoint {
                    account_id: row.get(0)?,
                    tracker_api_token: row.get(1)?,
                    checkpoint: DateTime::from_timestamp_nanos(row.get(2)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(checkpoints)
    }

    fn get_entity(&self, account_id: &str) -> Result<Option<Entity>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {} FROM entities WHERE account_id = ?1", ENTITY_COLUMNS),
            params![account_id],
            Self::row_to_entity,
        )
        .optional()
        .with_context(|| format!("Failed to read account {}", account_id))
    }

    fn commit_checkpoint(
        &self,
        account_id: &str,
        new_rewards: &[RewardId],
        checkpoint: DateTime<Utc>,
    ) -> Result<()> {
        let checkpoint_nanos = Self::checkpoint_to_nanos(checkpoint)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let stored: Option<(String, i64)> = tx
            .query_row(
                "SELECT rewards, checkpoint_nanos FROM entities WHERE account_id = ?1",
                params![account_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((raw_rewards, stored_nanos)) = stored else {
            bail!("Account {} does not exist", account_id);
        };

        let mut rewards: Vec<RewardId> = serde_json::from_str(&raw_rewards)
            .with_context(|| format!("Stored rewards of account {} are corrupt", account_id))?;
        rewards.extend_from_slice(new_rewards);

        tx.execute(
            "UPDATE entities SET rewards = ?1, checkpoint_nanos = ?2 WHERE account_id = ?3",
            params![
                serde_json::to_string(&rewards)?,
                checkpoint_nanos.max(stored_nanos),
                account_id
            ],
        )?;
        tx.commit()
            .with_context(|| format!("Failed to commit checkpoint of account {}", account_id))?;
        Ok(())
    }

    fn get_schema_version(&self) -> Result<Option<u64>> {
        let conn = self.lock()?;
        migrations::get_schema_version(&conn)
    }

    fn set_schema_version(&self, version: u64) -> Result<()> {
        let conn = self.lock()?;
        migrations::set_schema_version(&conn, version)
    }
}
