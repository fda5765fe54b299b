//! Spawns the DML workers.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::batch::{BatchShape, RowBatchGenerator};
use crate::classifier::ErrorClassifier;
use crate::cycle::{CycleTiming, MutationCycle};
use crate::error::Result;
use crate::shutdown::Shutdown;
use crate::statements::TableRef;
use crate::stats::RunStats;
use crate::store::Store;

/// Seed of worker `worker_id` for a run seeded with `base`.
pub fn worker_seed(base: u64, worker_id: usize) -> u64 {
    base ^ (worker_id as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// N independent mutation cycles over one shared store.
///
/// Every worker draws its keys from the same `[0, max_value0)` domain with its
/// own random source, so their batches overlap without coordination.
pub struct WorkerPool {
    size: usize,
    base_seed: u64,
    shape: BatchShape,
    table: TableRef,
    timing: CycleTiming,
}

impl WorkerPool {
    pub fn new(
        size: usize,
        base_seed: u64,
        shape: BatchShape,
        table: TableRef,
        timing: CycleTiming,
    ) -> Self {
        Self {
            size,
            base_seed,
            shape,
            table,
            timing,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Build the cycle for `worker_id` without starting it.
    pub fn cycle(
        &self,
        worker_id: usize,
        store: Arc<dyn Store>,
        classifier: Arc<ErrorClassifier>,
        stats: Arc<RunStats>,
    ) -> MutationCycle {
        let generator =
            RowBatchGenerator::seeded(self.shape.clone(), worker_seed(self.base_seed, worker_id));
        MutationCycle::new(
            worker_id,
            store,
            classifier,
            generator,
            self.table.clone(),
            self.timing,
            stats,
        )
    }

    /// Spawn every worker into `tasks`.
    pub fn spawn(
        &self,
        tasks: &mut JoinSet<Result<()>>,
        store: &Arc<dyn Store>,
        classifier: &Arc<ErrorClassifier>,
        stats: &Arc<RunStats>,
        shutdown: &Shutdown,
    ) {
        for worker_id in 0..self.size {
            let cycle = self.cycle(
                worker_id,
                Arc::clone(store),
                Arc::clone(classifier),
                Arc::clone(stats),
            );
            tasks.spawn(cycle.run(shutdown.clone()));
        }
    }
}
