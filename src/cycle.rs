//! Insert-then-delete unit of work repeated by each DML worker.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::batch::{RowBatch, RowBatchGenerator};
use crate::classifier::{Classification, ErrorClassifier, OperationKind};
use crate::error::{HarnessError, Result};
use crate::shutdown::Shutdown;
use crate::statements::{self, TableRef};
use crate::stats::RunStats;
use crate::store::{Statement, Store, StoreError};

/// Pauses and bounds of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    /// Rows stay live for this long before the delete.
    pub insert_pause: Duration,
    pub delete_pause: Duration,
    pub statement_timeout: Duration,
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self {
            insert_pause: Duration::from_millis(500),
            delete_pause: Duration::from_millis(500),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

/// Execute `statement` bounded by `timeout`; `None` if shutdown came first.
pub(crate) async fn execute_bounded(
    store: &dyn Store,
    statement: &Statement,
    timeout: Duration,
    shutdown: &mut Shutdown,
) -> Option<std::result::Result<u64, StoreError>> {
    let outcome = shutdown
        .run(tokio::time::timeout(timeout, store.execute(statement)))
        .await?;
    Some(outcome.unwrap_or_else(|_| Err(StoreError::timeout(timeout))))
}

/// What happened to one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Cancelled,
}

/// One DML worker: generate, insert, pause, delete, pause, forever.
pub struct MutationCycle {
    worker_id: usize,
    store: Arc<dyn Store>,
    classifier: Arc<ErrorClassifier>,
    generator: RowBatchGenerator,
    table: TableRef,
    timing: CycleTiming,
    stats: Arc<RunStats>,
}

impl MutationCycle {
    pub fn new(
        worker_id: usize,
        store: Arc<dyn Store>,
        classifier: Arc<ErrorClassifier>,
        generator: RowBatchGenerator,
        table: TableRef,
        timing: CycleTiming,
        stats: Arc<RunStats>,
    ) -> Self {
        Self {
            worker_id,
            store,
            classifier,
            generator,
            table,
            timing,
            stats,
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Loop until shutdown or a fatal race.
    pub async fn run(mut self, mut shutdown: Shutdown) -> Result<()> {
        info!("Worker {} started", self.worker_id);
        while !shutdown.is_triggered() {
            if self.run_once(&mut shutdown).await? == CycleOutcome::Cancelled {
                break;
            }
        }
        info!("Worker {} stopped", self.worker_id);
        Ok(())
    }

    /// A single iteration. Only an unexpected delete failure is an error.
    pub async fn run_once(&mut self, shutdown: &mut Shutdown) -> Result<CycleOutcome> {
        let batch = self.generator.generate();

        if !self.insert(&batch, shutdown).await {
            return Ok(CycleOutcome::Cancelled);
        }
        if !shutdown.sleep(self.timing.insert_pause).await {
            return Ok(CycleOutcome::Cancelled);
        }
        if !self.delete(&batch, shutdown).await? {
            return Ok(CycleOutcome::Cancelled);
        }
        self.stats.record_cycle();
        if !shutdown.sleep(self.timing.delete_pause).await {
            return Ok(CycleOutcome::Cancelled);
        }
        Ok(CycleOutcome::Completed)
    }

    /// Returns `false` when cancelled. Insert failures never stop the worker.
    async fn insert(&self, batch: &RowBatch, shutdown: &mut Shutdown) -> bool {
        let statement = statements::insert_batch(&self.table, batch);
        let Some(result) = execute_bounded(
            self.store.as_ref(),
            &statement,
            self.timing.statement_timeout,
            shutdown,
        )
        .await
        else {
            return false;
        };

        match result {
            Ok(_) => {
                self.stats.record_inserted(batch.len() as u64);
                info!("Worker {} - Inserted {} rows", self.worker_id, batch.len());
            }
            Err(err) => match self.classifier.classify(&err, OperationKind::Insert) {
                Classification::Benign => {
                    self.stats.record_duplicate_key();
                    info!(
                        "Worker {} - Duplicate key ignored ({} rows)",
                        self.worker_id,
                        batch.len()
                    );
                }
                Classification::Fatal => {
                    self.stats.record_insert_error();
                    warn!(
                        "Worker {} - Insert error ({} rows): {}",
                        self.worker_id,
                        batch.len(),
                        err
                    );
                }
            },
        }
        true
    }

    /// Returns `Ok(false)` when cancelled.
    async fn delete(&self, batch: &RowBatch, shutdown: &mut Shutdown) -> Result<bool> {
        let statement = statements::delete_by_val0(&self.table, &batch.keys());
        let Some(result) = execute_bounded(
            self.store.as_ref(),
            &statement,
            self.timing.statement_timeout,
            shutdown,
        )
        .await
        else {
            return Ok(false);
        };

        match result {
            Ok(affected) => {
                self.stats.record_deleted(affected);
                info!("Worker {} - Deleted {} rows", self.worker_id, affected);
                Ok(true)
            }
            Err(err) => match self.classifier.classify(&err, OperationKind::Delete) {
                Classification::Benign => {
                    self.stats.record_column_changed();
                    info!(
                        "Worker {} - Ignore column has changed error ({} rows): {}",
                        self.worker_id,
                        batch.len(),
                        err
                    );
                    Ok(true)
                }
                Classification::Fatal => {
                    error!(
                        "Worker {} - Delete error ({} rows): {}",
                        self.worker_id,
                        batch.len(),
                        err
                    );
                    Err(HarnessError::FatalRace {
                        worker_id: self.worker_id,
                        row_count: batch.len(),
                        source: err,
                    })
                }
            },
        }
    }
}
