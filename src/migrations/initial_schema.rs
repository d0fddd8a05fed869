use super::schema_version::CONFIGURATION_TABLE;
use super::Migration;
use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table};
use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::warn;

pub const ENTITIES_TABLE_V1: Table = Table {
    name: "entities",
    columns: &[
        sqlite_column!("account_id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("tracker_api_token", &SqlType::Text, non_null = true),
        sqlite_column!(
            "checkpoint_nanos",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "rewards",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
    ],
    indices: &[],
};

/// Creates the configuration and entities tables.
pub struct InitialSchema;

impl Migration for InitialSchema {
    fn version(&self) -> u64 {
        1
    }

    fn name(&self) -> &'static str {
        "initial_schema"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        for table in [&CONFIGURATION_TABLE, &ENTITIES_TABLE_V1] {
            table
                .create(conn)
                .with_context(|| format!("Failed to create table {}", table.name))?;
        }
        Ok(())
    }

    fn down(&self, conn: &Connection) -> Result<()> {
        // Keep going so that a half-created schema is torn down as far as possible
        let mut first_error = None;
        for table in [&ENTITIES_TABLE_V1, &CONFIGURATION_TABLE] {
            if let Err(e) = table.drop_table(conn) {
                warn!("Failed to drop table {}: {:#}", table.name, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
