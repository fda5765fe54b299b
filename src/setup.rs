//! Schema bootstrap. Runs once, before any worker starts.

use log::info;

use crate::error::{HarnessError, Result};
use crate::statements::{self, GlobalVar, TableRef};
use crate::store::{Statement, Store};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSetup {
    pub table: TableRef,
    pub padding_size: usize,
    pub unique_val0: bool,
    /// Applied in order after the table exists.
    pub global_vars: Vec<GlobalVar>,
}

impl SchemaSetup {
    /// Every statement in execution order, each with a step name for errors.
    pub fn steps(&self) -> Vec<(String, Statement)> {
        let mut steps = vec![
            (
                "create database".to_string(),
                statements::create_database(&self.table),
            ),
            (
                "drop existing table".to_string(),
                statements::drop_table(&self.table),
            ),
            (
                "create table".to_string(),
                statements::create_table(&self.table, self.padding_size, self.unique_val0),
            ),
        ];
        for var in &self.global_vars {
            steps.push((format!("set variable {}", var.name), var.statement()));
        }
        steps
    }

    /// Run every step; the first failure aborts with [`HarnessError::Setup`].
    pub async fn apply(&self, store: &dyn Store) -> Result<()> {
        for (step, statement) in self.steps() {
            store
                .execute(&statement)
                .await
                .map_err(|e| HarnessError::setup(step.clone(), e))?;
        }
        info!("Database and table {} created successfully", self.table);
        Ok(())
    }
}
