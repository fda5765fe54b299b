//! Run-wide counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every task, updated lock-free.
#[derive(Debug, Default)]
pub struct RunStats {
    cycles: AtomicU64,
    rows_inserted: AtomicU64,
    rows_deleted: AtomicU64,
    duplicate_key_races: AtomicU64,
    column_changed_races: AtomicU64,
    insert_errors: AtomicU64,
    schema_changes: AtomicU64,
    schema_change_failures: AtomicU64,
}

/// Point-in-time copy of [`RunStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub cycles: u64,
    pub rows_inserted: u64,
    pub rows_deleted: u64,
    pub duplicate_key_races: u64,
    pub column_changed_races: u64,
    pub insert_errors: u64,
    pub schema_changes: u64,
    pub schema_change_failures: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_inserted(&self, rows: u64) {
        self.rows_inserted.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_deleted(&self, rows: u64) {
        self.rows_deleted.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn record_duplicate_key(&self) {
        self.duplicate_key_races.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_column_changed(&self) {
        self.column_changed_races.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert_error(&self) {
        self.insert_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_schema_change(&self, ok: bool) {
        if ok {
            self.schema_changes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.schema_change_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            rows_inserted: self.rows_inserted.load(Ordering::Relaxed),
            rows_deleted: self.rows_deleted.load(Ordering::Relaxed),
            duplicate_key_races: self.duplicate_key_races.load(Ordering::Relaxed),
            column_changed_races: self.column_changed_races.load(Ordering::Relaxed),
            insert_errors: self.insert_errors.load(Ordering::Relaxed),
            schema_changes: self.schema_changes.load(Ordering::Relaxed),
            schema_change_failures: self.schema_change_failures.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Multi-line summary for the console.
    pub fn render(&self) -> String {
        [
            format!("  Cycles:           {}", self.cycles),
            format!("  Rows inserted:    {}", self.rows_inserted),
            format!("  Rows deleted:     {}", self.rows_deleted),
            format!("  Duplicate keys:   {}", self.duplicate_key_races),
            format!("  Column changed:   {}", self.column_changed_races),
            format!("  Insert errors:    {}", self.insert_errors),
            format!(
                "  Schema changes:   {} ok, {} failed",
                self.schema_changes, self.schema_change_failures
            ),
        ]
        .join("\n")
    }
}
