use super::Migration;
use crate::sqlite_column;
use crate::sqlite_persistence::{column_exists, Column, SqlType};
use anyhow::Result;
use rusqlite::Connection;

const CREATED_AT_COLUMN: Column = sqlite_column!(
    "created_at",
    &SqlType::Integer,
    non_null = true,
    default_value = Some("0")
);

/// Adds a registration timestamp (unix seconds) to entities. Rows that
/// existed before the migration are stamped with the migration time.
pub struct EntityTimestamps;

impl Migration for EntityTimestamps {
    fn version(&self) -> u64 {
        2
    }

    fn name(&self) -> &'static str {
        "entity_timestamps"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        if !column_exists(conn, "entities", CREATED_AT_COLUMN.name)? {
            conn.execute(
                &format!(
                    "ALTER TABLE entities ADD COLUMN {}",
                    CREATED_AT_COLUMN.definition()
                ),
                [],
            )?;
        }
        conn.execute(
            "UPDATE entities SET created_at = cast(strftime('%s','now') as int) WHERE created_at = 0",
            [],
        )?;
        Ok(())
    }

    fn down(&self, conn: &Connection) -> Result<()> {
        if column_exists(conn, "entities", CREATED_AT_COLUMN.name)? {
            conn.execute(
                &format!("ALTER TABLE entities DROP COLUMN {}", CREATED_AT_COLUMN.name),
                [],
            )?;
        }
        Ok(())
    }
}
