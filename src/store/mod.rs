//! Store collaborator
//!
//! The harness never talks to a database directly: every statement goes
//! through [`Store::execute`], which must be safe for concurrent callers.

mod mysql;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

pub use mysql::MySqlStore;

/// Positional statement argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

/// A SQL statement with its positional (`?`) arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

impl Statement {
    /// A statement without placeholders.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(sql: impl Into<String>, args: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

/// Structured failure reported by a [`Store`].
///
/// `code` and `sql_state` are filled for server-side errors; client-side
/// failures (I/O, pool exhaustion, timeouts) only carry a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: Option<u16>,
    pub sql_state: Option<String>,
    pub message: String,
}

impl StoreError {
    pub fn server(code: u16, sql_state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            sql_state: Some(sql_state.into()),
            message: message.into(),
        }
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self {
            code: None,
            sql_state: None,
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::client(format!("statement timed out after {}ms", after.as_millis()))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.sql_state.as_deref()) {
            (Some(code), Some(state)) => write!(f, "Error {} ({}): {}", code, state, self.message),
            (Some(code), None) => write!(f, "Error {}: {}", code, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Executes statements against the store under test.
#[async_trait]
pub trait Store: Send + Sync {
    /// Execute one statement and return the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError>;
}
