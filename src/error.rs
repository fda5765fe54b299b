//! Error types for the DDL race harness
//!
//! Only two things stop a run: a schema bootstrap that could not complete and a
//! delete that failed for a reason other than the documented shape-change race.
//! Everything else is classified, counted, logged and left behind.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that terminate a harness run
#[derive(Error, Debug)]
pub enum HarnessError {
    /// Schema bootstrap failed before any worker started.
    #[error("schema setup failed during '{step}': {source}")]
    Setup {
        step: String,
        #[source]
        source: StoreError,
    },

    /// A delete failed with an error matching no benign signature.
    #[error("worker {worker_id} hit a fatal race deleting {row_count} rows: {source}")]
    FatalRace {
        worker_id: usize,
        row_count: usize,
        #[source]
        source: StoreError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A harness task panicked or was aborted.
    #[error("Task error: {0}")]
    Task(String),
}

impl HarnessError {
    pub fn setup(step: impl Into<String>, source: StoreError) -> Self {
        HarnessError::Setup {
            step: step.into(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        HarnessError::Config(msg.into())
    }

    /// True for the positive detection signal of the harness.
    pub fn is_fatal_race(&self) -> bool {
        matches!(self, HarnessError::FatalRace { .. })
    }
}
