//! SQL for the quote table
//!
//! Table names are interpolated; they are [`TableName`]s and therefore already
//! restricted to plain identifiers. Row values always go through binds.

use super::{Statement, TableName};
use crate::record::QuoteRow;

/// `CREATE TABLE IF NOT EXISTS` with every column stored as text, nullable
/// only where the source may omit the value.
pub fn create_table(table: &TableName) -> Statement {
    Statement::new(format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
            amount TEXT NOT NULL, \
            base TEXT NOT NULL, \
            currency TEXT NOT NULL, \
            source_timestamp TEXT NULL, \
            extract_at TEXT NOT NULL\
        )"
    ))
}

pub fn truncate(table: &TableName) -> Statement {
    Statement::new(format!("TRUNCATE TABLE {table}"))
}

pub fn insert(table: &TableName, row: &QuoteRow) -> Statement {
    let columns = QuoteRow::COLUMNS.join(", ");
    let placeholders = (1..=QuoteRow::COLUMNS.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");

    row.values().into_iter().fold(
        Statement::new(format!("INSERT INTO {table} ({columns}) VALUES ({placeholders})")),
        Statement::bind,
    )
}
