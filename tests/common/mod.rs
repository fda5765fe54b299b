#![allow(dead_code)]
//! In-memory store for race scenarios.
//!
//! Understands exactly the three statement shapes the harness issues:
//! multi-row INSERT, DELETE ... IN (...), and ALTER TABLE.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ddl_race_harness::{
    BatchShape, ColumnOscillation, CycleTiming, ErrorClassifier, Orchestrator, SqlValue,
    Statement, Store, StoreError, TableRef, WorkerPool,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct FakeCounters {
    pub inserts: u64,
    pub duplicate_keys: u64,
    pub deletes: u64,
    pub column_changed: u64,
    pub alters: u64,
}

#[derive(Default)]
struct FakeState {
    /// val0 -> schema versions the live rows were written under
    rows: HashMap<i64, Vec<u64>>,
    schema_version: u64,
    counters: FakeCounters,
}

pub struct FakeStore {
    /// Reject inserts touching a live val0.
    unique_val0: bool,
    /// Fail deletes that reference rows written before the latest ALTER.
    shape_change_races: bool,
    /// Returned by every DELETE when set.
    delete_failure: Option<StoreError>,
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            unique_val0: false,
            shape_change_races: false,
            delete_failure: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_unique_val0(mut self) -> Self {
        self.unique_val0 = true;
        self
    }

    pub fn with_shape_change_races(mut self) -> Self {
        self.shape_change_races = true;
        self
    }

    pub fn failing_deletes(mut self, err: StoreError) -> Self {
        self.delete_failure = Some(err);
        self
    }

    pub fn counters(&self) -> FakeCounters {
        self.state.lock().unwrap().counters
    }

    pub fn live_rows(&self) -> usize {
        self.state.lock().unwrap().rows.values().map(Vec::len).sum()
    }

    fn insert(&self, args: &[SqlValue]) -> Result<u64, StoreError> {
        let keys: Vec<i64> = args
            .chunks(3)
            .map(|chunk| match chunk {
                [SqlValue::Int(val0), SqlValue::Int(val1), SqlValue::Text(_)] => {
                    assert_eq!(*val1, val0 * 10, "val1 invariant broken before store");
                    Ok(*val0)
                }
                other => Err(StoreError::client(format!("malformed insert args: {:?}", other))),
            })
            .collect::<Result<_, _>>()?;

        let mut state = self.state.lock().unwrap();
        if self.unique_val0 {
            if let Some(dup) = keys.iter().find(|k| state.rows.contains_key(*k)) {
                state.counters.duplicate_keys += 1;
                return Err(StoreError::server(
                    1062,
                    "23000",
                    format!("Duplicate entry '{}' for key 'rows.idx_val0'", dup),
                ));
            }
        }
        let version = state.schema_version;
        for key in &keys {
            state.rows.entry(*key).or_default().push(version);
        }
        state.counters.inserts += 1;
        Ok(keys.len() as u64)
    }

    fn delete(&self, args: &[SqlValue]) -> Result<u64, StoreError> {
        if let Some(ref err) = self.delete_failure {
            return Err(err.clone());
        }

        let mut state = self.state.lock().unwrap();
        let current = state.schema_version;
        let keys: Vec<i64> = args
            .iter()
            .filter_map(|v| match v {
                SqlValue::Int(k) => Some(*k),
                SqlValue::Text(_) => None,
            })
            .collect();

        if self.shape_change_races {
            let stale = keys.iter().any(|k| {
                state
                    .rows
                    .get(k)
                    .is_some_and(|versions| versions.iter().any(|&v| v < current))
            });
            if stale {
                // The next attempt sees the new shape.
                for key in &keys {
                    if let Some(versions) = state.rows.get_mut(key) {
                        versions.iter_mut().for_each(|v| *v = current);
                    }
                }
                state.counters.column_changed += 1;
                return Err(StoreError::server(8028, "HY000", "public column val0 has changed"));
            }
        }

        let mut affected = 0u64;
        for key in &keys {
            if let Some(versions) = state.rows.remove(key) {
                affected += versions.len() as u64;
            }
        }
        state.counters.deletes += 1;
        Ok(affected)
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        // Let other tasks interleave between statements.
        tokio::task::yield_now().await;

        if statement.sql.starts_with("INSERT") {
            self.insert(&statement.args)
        } else if statement.sql.starts_with("DELETE") {
            self.delete(&statement.args)
        } else if statement.sql.starts_with("ALTER") {
            let mut state = self.state.lock().unwrap();
            state.schema_version += 1;
            state.counters.alters += 1;
            Ok(0)
        } else {
            Err(StoreError::client(format!("unsupported statement: {}", statement.sql)))
        }
    }
}

/// Short pauses so scenarios finish in well under a second.
pub fn fast_timing(insert_pause_ms: u64) -> CycleTiming {
    CycleTiming {
        insert_pause: Duration::from_millis(insert_pause_ms),
        delete_pause: Duration::from_millis(5),
        statement_timeout: Duration::from_secs(5),
    }
}

pub fn table() -> TableRef {
    TableRef::new("uniq", "rows").unwrap()
}

pub fn orchestrator(
    store: Arc<FakeStore>,
    workers: usize,
    shape: BatchShape,
    timing: CycleTiming,
    ddl_period: Option<Duration>,
) -> Orchestrator {
    let pool = WorkerPool::new(workers, 1234, shape, table(), timing);
    let oscillation = ddl_period.map(|period| ColumnOscillation {
        period,
        statement_timeout: Duration::from_secs(5),
        ..ColumnOscillation::default()
    });
    Orchestrator::new(store, ErrorClassifier::tidb(), pool, table(), oscillation)
}
