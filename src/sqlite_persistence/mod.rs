mod table;

pub use table::{column_exists, table_exists, Column, SqlType, Table};
