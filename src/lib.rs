//! Concurrency stress harness for online schema changes.
//!
//! N workers insert and delete overlapping batches of rows while one task keeps
//! widening and narrowing a column's type. Expected races (duplicate keys on
//! insert, "column has changed" on delete) are tolerated; any other delete
//! failure stops the run as a detected defect.

pub mod batch;
pub mod classifier;
pub mod config;
pub mod cycle;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod pool;
pub mod report;
pub mod schema_mutator;
pub mod setup;
pub mod shutdown;
pub mod statements;
pub mod stats;
pub mod store;

pub use batch::{BatchShape, Row, RowBatch, RowBatchGenerator};
pub use classifier::{Classification, ErrorClassifier, OperationKind, Signature};
pub use config::{Config, HarnessSettings};
pub use cycle::{CycleOutcome, CycleTiming, MutationCycle};
pub use error::{HarnessError, Result};
pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
pub use schema_mutator::{ColumnOscillation, SchemaMutator};
pub use shutdown::Shutdown;
pub use statements::TableRef;
pub use stats::{RunStats, StatsSnapshot};
pub use store::{MySqlStore, SqlValue, Statement, Store, StoreError};
