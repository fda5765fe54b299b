//! Run lifetime: start the schema mutator and the worker pool, wait for a
//! shutdown request or the first fatal race, then stop and join everything.

use std::future::Future;
use std::sync::Arc;

use log::info;
use tokio::task::JoinSet;

use crate::classifier::ErrorClassifier;
use crate::error::{HarnessError, Result};
use crate::pool::WorkerPool;
use crate::schema_mutator::{ColumnOscillation, SchemaMutator};
use crate::shutdown;
use crate::statements::TableRef;
use crate::stats::RunStats;
use crate::store::Store;

pub struct Orchestrator {
    store: Arc<dyn Store>,
    classifier: Arc<ErrorClassifier>,
    pool: WorkerPool,
    table: TableRef,
    /// `None` runs DML only.
    oscillation: Option<ColumnOscillation>,
    stats: Arc<RunStats>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        classifier: ErrorClassifier,
        pool: WorkerPool,
        table: TableRef,
        oscillation: Option<ColumnOscillation>,
    ) -> Self {
        Self {
            store,
            classifier: Arc::new(classifier),
            pool,
            table,
            oscillation,
            stats: Arc::new(RunStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Run until `stop` resolves (clean shutdown, `Ok`) or a worker reports a
    /// fatal race (its error is returned, not logged). All tasks are joined
    /// either way.
    pub async fn run<S>(&self, stop: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        let (stop_tx, listener) = shutdown::channel();
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        if let Some(oscillation) = self.oscillation.clone() {
            let mutator = SchemaMutator::new(
                Arc::clone(&self.store),
                self.table.clone(),
                oscillation,
                Arc::clone(&self.stats),
            );
            let listener = listener.clone();
            tasks.spawn(async move {
                mutator.run(listener).await;
                Ok(())
            });
        }
        self.pool.spawn(
            &mut tasks,
            &self.store,
            &self.classifier,
            &self.stats,
            &listener,
        );
        drop(listener);
        info!("Started {} workers", self.pool.size());

        tokio::pin!(stop);
        let mut stopping = false;
        let mut outcome: Result<()> = Ok(());

        loop {
            tokio::select! {
                _ = &mut stop, if !stopping => {
                    info!("Shutdown requested, stopping workers");
                    stopping = true;
                    let _ = stop_tx.send(true);
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    let failure = match joined {
                        Ok(Ok(())) => None,
                        Ok(Err(err)) => Some(err),
                        Err(join_err) => Some(HarnessError::Task(join_err.to_string())),
                    };
                    if let Some(err) = failure {
                        if outcome.is_ok() {
                            outcome = Err(err);
                        }
                        stopping = true;
                        let _ = stop_tx.send(true);
                    }
                }
            }
        }

        info!("All workers stopped");
        outcome
    }
}
