use super::schema_version::{get_schema_version, set_schema_version};
use super::{Migration, MigrationError, MigrationSet};
use rusqlite::Connection;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    Pending,
    Applying,
    Applied,
    /// Already covered by the stored schema version.
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub version: u64,
    pub name: &'static str,
    pub state: MigrationState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u64,
    pub to_version: u64,
    pub outcomes: Vec<MigrationOutcome>,
}

impl MigrationReport {
    pub fn applied(&self) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter(|o| o.state == MigrationState::Applied)
            .map(|o| o.version)
            .collect()
    }

    pub fn is_noop(&self) -> bool {
        self.from_version == self.to_version
    }
}

pub struct MigrationRunner {
    set: MigrationSet,
}

impl MigrationRunner {
    pub fn new(set: MigrationSet) -> Self {
        Self { set }
    }

    /// Applies every migration newer than the stored schema version, in
    /// ascending order. Stops at the first failure after attempting that
    /// migration's `down`; migrations applied earlier in the run stay applied.
    pub fn run(&self, conn: &Connection) -> Result<MigrationReport, MigrationError> {
        let from_version = get_schema_version(conn)
            .map_err(MigrationError::ReadVersion)?
            .unwrap_or(0);

        let mut outcomes: Vec<MigrationOutcome> = self
            .set
            .iter()
            .map(|m| MigrationOutcome {
                version: m.version(),
                name: m.name(),
                state: if m.version() <= from_version {
                    MigrationState::Skipped
                } else {
                    MigrationState::Pending
                },
            })
            .collect();

        let pending = outcomes
            .iter()
            .filter(|o| o.state == MigrationState::Pending)
            .count();
        if pending == 0 {
            debug!("Schema is up to date at version {}", from_version);
        } else {
            info!(
                "Schema at version {}, {} migration(s) pending",
                from_version, pending
            );
        }

        let mut current = from_version;
        for (migration, outcome) in self.set.iter().zip(outcomes.iter_mut()) {
            if outcome.state != MigrationState::Pending {
                continue;
            }

            outcome.state = MigrationState::Applying;
            info!(
                "Applying migration {} (version {})",
                migration.name(),
                migration.version()
            );

            if let Err(source) = migration.up(conn) {
                outcome.state = MigrationState::Failed;
                error!(
                    "Migration {} (version {}) failed: {:#}",
                    migration.name(),
                    migration.version(),
                    source
                );
                compensate(migration, conn);
                return Err(MigrationError::Apply {
                    version: migration.version(),
                    name: migration.name(),
                    source,
                });
            }

            if let Err(source) = set_schema_version(conn, migration.version()) {
                outcome.state = MigrationState::Failed;
                error!(
                    "Could not record schema version {}: {:#}",
                    migration.version(),
                    source
                );
                compensate(migration, conn);
                return Err(MigrationError::PersistVersion {
                    version: migration.version(),
                    name: migration.name(),
                    source,
                });
            }

            outcome.state = MigrationState::Applied;
            current = migration.version();
        }

        if current != from_version {
            info!("Schema migrated from version {} to {}", from_version, current);
        }

        Ok(MigrationReport {
            from_version,
            to_version: current,
            outcomes,
        })
    }
}

/// Best-effort rollback of a single failed migration.
fn compensate(migration: &dyn Migration, conn: &Connection) {
    match migration.down(conn) {
        Ok(()) => info!("Rolled back migration {}", migration.name()),
        Err(e) => error!(
            "Rollback of migration {} (version {}) failed: {:#}",
            migration.name(),
            migration.version(),
            e
        ),
    }
}
