use anyhow::Result;
use rusqlite::{params, Connection};

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            #[allow(unused_mut)]
            let mut column = $crate::sqlite_persistence::Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub default_value: Option<&'static str>,
}

impl Column {
    /// Column definition as it appears in CREATE TABLE and ALTER TABLE ADD COLUMN.
    pub fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.is_primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.non_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default_value) = self.default_value {
            sql.push_str(&format!(" DEFAULT {}", default_value));
        }
        sql
    }
}

/// Declarative table definition. Creation and removal are idempotent so a
/// migration built on top of them can be re-run after a partial failure.
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let columns = self
            .columns
            .iter()
            .map(Column::definition)
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!("CREATE TABLE IF NOT EXISTS {} ({});", self.name, columns),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }

    pub fn drop_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(&format!("DROP TABLE IF EXISTS {};", self.name), params![])?;
        Ok(())
    }
}

pub fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table_name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn column_exists(conn: &Connection, table_name: &str, column_name: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table_name))?;
    let names = stmt
        .query_map(params![], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|name| name == column_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TABLE: Table = Table {
        name: "test_table",
        columns: &[
            sqlite_column!("id", &SqlType::Text, is_primary_key = true),
            sqlite_column!("counter", &SqlType::Integer, non_null = true, default_value = Some("0")),
        ],
        indices: &[("idx_test_counter", "counter")],
    };

    #[test]
    fn test_column_definition() {
        let column = sqlite_column!(
            "counter",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        );
        assert_eq!(column.definition(), "counter INTEGER NOT NULL DEFAULT 0");

        let column = sqlite_column!("id", &SqlType::Text, is_primary_key = true);
        assert_eq!(column.definition(), "id TEXT PRIMARY KEY");
    }

    #[test]
    fn test_create_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create(&conn).unwrap();
        TEST_TABLE.create(&conn).unwrap();

        assert!(table_exists(&conn, "test_table").unwrap());
        assert!(column_exists(&conn, "test_table", "counter").unwrap());
        assert!(!column_exists(&conn, "test_table", "missing").unwrap());

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_test_counter'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 1);
    }

    #[test]
    fn test_drop_removes_table_and_tolerates_absence() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_TABLE.create(&conn).unwrap();
        TEST_TABLE.drop_table(&conn).unwrap();
        assert!(!table_exists(&conn, "test_table").unwrap());

        TEST_TABLE.drop_table(&conn).unwrap();
    }
}
