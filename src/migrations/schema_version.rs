//! Persistence of the highest fully-applied migration version.
//!
//! The version lives in the `configuration` key-value table, which is itself
//! created by the first migration. Until then the version reads as absent.

use crate::sqlite_column;
use crate::sqlite_persistence::{table_exists, Column, SqlType, Table};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

pub const SCHEMA_VERSION_KEY: &str = "schema_version";

pub const CONFIGURATION_TABLE: Table = Table {
    name: "configuration",
    columns: &[
        sqlite_column!("name", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
    ],
    indices: &[],
};

/// Returns `Ok(None)` when no version was ever recorded.
pub fn get_schema_version(conn: &Connection) -> Result<Option<u64>> {
    if !table_exists(conn, CONFIGURATION_TABLE.name)? {
        return Ok(None);
    }

    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM configuration WHERE name = ?1",
            params![SCHEMA_VERSION_KEY],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to read schema version")?;

    raw.map(|value| {
        value
            .parse::<u64>()
            .with_context(|| format!("Stored schema version is not a number: {:?}", value))
    })
    .transpose()
}

/// Records `version`, updating the existing row or inserting it.
pub fn set_schema_version(conn: &Connection, version: u64) -> Result<()> {
    let tx = conn
        .unchecked_transaction()
        .context("Failed to begin schema version transaction")?;

    let updated = tx.execute(
        "UPDATE configuration SET value = ?1 WHERE name = ?2",
        params![version.to_string(), SCHEMA_VERSION_KEY],
    )?;
    if updated == 0 {
        tx.execute(
            "INSERT INTO configuration (name, value) VALUES (?1, ?2)",
            params![SCHEMA_VERSION_KEY, version.to_string()],
        )?;
    }

    tx.commit().context("Failed to commit schema version")?;
    Ok(())
}
