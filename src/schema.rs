//! Table definitions and the SQL statement builders.
//!
//! Identifiers are interpolated into statement text, so every table and
//! column name is checked against `[A-Za-z_][A-Za-z0-9_]*` first. Column
//! clauses are trusted text and go through as-is; the engine rejects
//! malformed ones at DDL time. Values are never interpolated.

use serde::Deserialize;

use crate::error::{StoreError, StoreResult};
use crate::value::Row;

/// Schema definition for the database
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(mut self, table: TableSchema) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, clause: impl Into<String>) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            clause: clause.into(),
        });
        self
    }
}

/// A column name and its raw type/constraint clause, e.g. `text not null`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub clause: String,
}

/// Reject anything that is not a plain SQL identifier.
pub fn validate_identifier(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::Schema(format!("invalid identifier: {name:?}")))
    }
}

/// `CREATE TABLE IF NOT EXISTS <name> (<col> <clause>, ...)`
pub fn create_table_sql(table: &TableSchema) -> StoreResult<String> {
    validate_identifier(&table.name)?;
    if table.columns.is_empty() {
        return Err(StoreError::Schema(format!(
            "table {} has no columns",
            table.name
        )));
    }
    let columns = table
        .columns
        .iter()
        .map(|col| {
            validate_identifier(&col.name)?;
            Ok(format!("{} {}", col.name, col.clause))
        })
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        table.name,
        columns.join(", ")
    ))
}

/// `INSERT INTO <table> (<cols>) VALUES (?1, ?2, ...)` with one numbered
/// placeholder per column of `row`, in row order.
pub fn insert_sql(table: &str, row: &Row) -> StoreResult<String> {
    validate_identifier(table)?;
    if row.is_empty() {
        return Ok(format!("INSERT INTO {table} DEFAULT VALUES"));
    }
    let names = row
        .column_names()
        .map(|name| validate_identifier(name).map(|()| name))
        .collect::<StoreResult<Vec<_>>>()?;
    let placeholders = (1..=names.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>();
    Ok(format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        names.join(", "),
        placeholders.join(", ")
    ))
}

/// `DROP TABLE IF EXISTS <name>`
pub fn drop_table_sql(name: &str) -> StoreResult<String> {
    validate_identifier(name)?;
    Ok(format!("DROP TABLE IF EXISTS {name}"))
}
