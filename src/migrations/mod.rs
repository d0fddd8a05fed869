//! Versioned schema migrations.
//!
//! Migrations are collected into an explicit [`MigrationSet`] at startup and
//! applied in ascending version order by the [`MigrationRunner`]. The highest
//! applied version is persisted in the `configuration` table so that a
//! migration is applied at most once per database.

mod entity_timestamps;
mod initial_schema;
mod runner;
mod schema_version;

pub use entity_timestamps::EntityTimestamps;
pub use initial_schema::{InitialSchema, ENTITIES_TABLE_V1};
pub use runner::{MigrationOutcome, MigrationReport, MigrationRunner, MigrationState};
pub use schema_version::{get_schema_version, set_schema_version, CONFIGURATION_TABLE};

use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashSet;
use thiserror::Error;

/// A reversible schema change.
///
/// `up` may be re-run after a crash between applying it and recording its
/// version, so it must tolerate finding its own effect already in place.
pub trait Migration: Send + Sync {
    fn version(&self) -> u64;
    fn name(&self) -> &'static str;
    fn up(&self, conn: &Connection) -> Result<()>;
    fn down(&self, conn: &Connection) -> Result<()>;
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Two migrations share version {0}")]
    DuplicateVersion(u64),

    #[error("Migration {0} has an invalid version, versions start at 1")]
    InvalidVersion(&'static str),

    #[error("Failed to read schema version: {0:#}")]
    ReadVersion(#[source] anyhow::Error),

    #[error("Migration {name} (version {version}) failed: {source:#}")]
    Apply {
        version: u64,
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Migration {name} (version {version}) applied but its version could not be recorded: {source:#}")]
    PersistVersion {
        version: u64,
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Immutable, version-ordered collection of migrations.
pub struct MigrationSet {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationSet {
    /// Builds the set from migrations given in any order.
    pub fn new(mut migrations: Vec<Box<dyn Migration>>) -> Result<Self, MigrationError> {
        let mut seen = HashSet::new();
        for migration in &migrations {
            if migration.version() == 0 {
                return Err(MigrationError::InvalidVersion(migration.name()));
            }
            if !seen.insert(migration.version()) {
                return Err(MigrationError::DuplicateVersion(migration.version()));
            }
        }
        migrations.sort_by_key(|m| m.version());
        Ok(Self { migrations })
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    pub fn versions(&self) -> Vec<u64> {
        self.iter().map(|m| m.version()).collect()
    }

    pub fn latest_version(&self) -> Option<u64> {
        self.migrations.last().map(|m| m.version())
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

/// The migrations that make up the current schema.
pub fn default_migrations() -> MigrationSet {
    // Listed in version order
    MigrationSet {
        migrations: vec![Box::new(InitialSchema), Box::new(EntityTimestamps)],
    }
}
