//! SQL text for every statement the harness issues.

use std::fmt;

use crate::batch::RowBatch;
use crate::error::{HarnessError, Result};
use crate::store::{SqlValue, Statement};

/// Backtick-qualified `database.table` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub database: String,
    pub table: String,
}

impl TableRef {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Result<Self> {
        let database = database.into();
        let table = table.into();
        validate_identifier("database", &database)?;
        validate_identifier("table", &table)?;
        Ok(Self { database, table })
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`.`{}`", self.database, self.table)
    }
}

/// Identifiers are interpolated into SQL text, so only `[A-Za-z0-9_]` is accepted.
pub fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(HarnessError::config(format!(
            "{} name '{}' must be non-empty and contain only [A-Za-z0-9_]",
            kind, name
        )));
    }
    Ok(())
}

/// One multi-row INSERT covering the whole batch.
pub fn insert_batch(table: &TableRef, batch: &RowBatch) -> Statement {
    let placeholders = vec!["(?, ?, ?)"; batch.len()].join(", ");
    let mut args = Vec::with_capacity(batch.len() * 3);
    for row in batch.rows() {
        args.push(SqlValue::Int(row.val0));
        args.push(SqlValue::Int(row.val1));
        args.push(SqlValue::Text(row.padding.clone()));
    }
    Statement::with_args(
        format!(
            "INSERT INTO {} (val0, val1, padding) VALUES {}",
            table, placeholders
        ),
        args,
    )
}

/// DELETE of every row whose `val0` is in `keys`.
pub fn delete_by_val0(table: &TableRef, keys: &[i64]) -> Statement {
    let placeholders = vec!["?"; keys.len()].join(", ");
    Statement::with_args(
        format!("DELETE FROM {} WHERE val0 IN ({})", table, placeholders),
        keys.iter().copied().map(SqlValue::Int).collect(),
    )
}

pub fn modify_column(table: &TableRef, column: &str, sql_type: &str) -> Statement {
    Statement::raw(format!(
        "ALTER TABLE {} MODIFY COLUMN `{}` {} NOT NULL",
        table, column, sql_type
    ))
}

pub fn create_database(table: &TableRef) -> Statement {
    Statement::raw(format!("CREATE DATABASE IF NOT EXISTS `{}`", table.database))
}

pub fn drop_table(table: &TableRef) -> Statement {
    Statement::raw(format!("DROP TABLE IF EXISTS {}", table))
}

pub fn create_table(table: &TableRef, padding_size: usize, unique_val0: bool) -> Statement {
    let unique = if unique_val0 {
        ",\n    UNIQUE KEY idx_val0 (val0)"
    } else {
        ""
    };
    Statement::raw(format!(
        "CREATE TABLE {} (\n    id int NOT NULL AUTO_INCREMENT,\n    val0 int NOT NULL,\n    val1 int NOT NULL,\n    padding varchar({}) NOT NULL DEFAULT '',\n    PRIMARY KEY (id){}\n)",
        table, padding_size, unique
    ))
}

/// A `name=value` global variable assignment applied during setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalVar {
    pub name: String,
    pub value: String,
}

impl GlobalVar {
    pub fn parse(assignment: &str) -> Result<Self> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            HarnessError::config(format!(
                "global variable '{}' must be written as name=value",
                assignment
            ))
        })?;
        let name = name.trim();
        let value = value.trim();
        validate_identifier("variable", name)?;
        if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || "_.-".contains(c)) {
            return Err(HarnessError::config(format!(
                "global variable '{}' has an unsupported value '{}'",
                name, value
            )));
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn statement(&self) -> Statement {
        Statement::raw(format!("SET @@global.{} = {}", self.name, self.value))
    }
}
