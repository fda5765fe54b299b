//! Periodic column type oscillation racing the DML workers.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::cycle::execute_bounded;
use crate::shutdown::Shutdown;
use crate::statements::{self, TableRef};
use crate::stats::RunStats;
use crate::store::Store;

/// Which column to reshape and between which two types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOscillation {
    pub column: String,
    pub wide_type: String,
    pub narrow_type: String,
    pub period: Duration,
    pub statement_timeout: Duration,
}

impl Default for ColumnOscillation {
    fn default() -> Self {
        Self {
            column: "val0".to_string(),
            wide_type: "bigint".to_string(),
            narrow_type: "int".to_string(),
            period: Duration::from_secs(1),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

/// Widens then narrows the target column once per period. Never fails.
pub struct SchemaMutator {
    store: Arc<dyn Store>,
    table: TableRef,
    oscillation: ColumnOscillation,
    stats: Arc<RunStats>,
}

impl SchemaMutator {
    pub fn new(
        store: Arc<dyn Store>,
        table: TableRef,
        oscillation: ColumnOscillation,
        stats: Arc<RunStats>,
    ) -> Self {
        Self {
            store,
            table,
            oscillation,
            stats,
        }
    }

    pub async fn run(self, mut shutdown: Shutdown) {
        info!("DDL worker started");
        while shutdown.sleep(self.oscillation.period).await {
            if !self.apply(&self.oscillation.wide_type, &mut shutdown).await {
                break;
            }
            if !self.apply(&self.oscillation.narrow_type, &mut shutdown).await {
                break;
            }
        }
        info!("DDL worker stopped");
    }

    /// One MODIFY COLUMN attempt; failures are logged and counted. Returns
    /// `false` when cancelled.
    pub async fn apply(&self, sql_type: &str, shutdown: &mut Shutdown) -> bool {
        let column = &self.oscillation.column;
        let statement = statements::modify_column(&self.table, column, sql_type);

        info!("DDL - Modifying {} to {}", column, sql_type);
        let Some(result) = execute_bounded(
            self.store.as_ref(),
            &statement,
            self.oscillation.statement_timeout,
            shutdown,
        )
        .await
        else {
            return false;
        };

        match result {
            Ok(_) => {
                self.stats.record_schema_change(true);
                info!("DDL - Successfully modified {} to {}", column, sql_type);
            }
            Err(err) => {
                self.stats.record_schema_change(false);
                warn!("DDL error ({}): {}", sql_type, err);
            }
        }
        true
    }
}
