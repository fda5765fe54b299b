use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::batch::BatchShape;
use crate::cycle::CycleTiming;
use crate::error::{HarnessError, Result};
use crate::schema_mutator::ColumnOscillation;
use crate::setup::SchemaSetup;
use crate::statements::{validate_identifier, GlobalVar, TableRef};

/// Column whose declared type oscillates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetColumn {
    Val0,
    Val1,
}

impl TargetColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetColumn::Val0 => "val0",
            TargetColumn::Val1 => "val1",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact text: timestamp LEVEL target - message
    Compact,
    /// JSON Lines
    Json,
}

/// CLI configuration for the harness.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ddl-race-harness",
    about = "Races online column type changes against overlapping INSERT/DELETE traffic"
)]
pub struct Config {
    /// MySQL-protocol connection URL of the store under test
    #[arg(long, default_value = "mysql://root@localhost:4000/", env = "HARNESS_MYSQL_URL")]
    pub url: String,

    /// Maximum pooled connections (defaults to workers + 2)
    #[arg(long, env = "HARNESS_MAX_CONNECTIONS")]
    pub max_connections: Option<usize>,

    #[arg(long, default_value = "uniq")]
    pub database: String,

    #[arg(long, default_value = "rows")]
    pub table: String,

    /// Number of concurrent insert/delete workers
    #[arg(long, default_value_t = 16)]
    pub workers: usize,

    /// Exclusive upper bound of val0, the shared contention key
    #[arg(long, default_value_t = 1000)]
    pub max_value0: i64,

    /// Width of the padding column in characters
    #[arg(long, default_value_t = 256)]
    pub padding_size: usize,

    /// Rows per batch, drawn uniformly from this set
    #[arg(long, value_delimiter = ',', default_value = "10,50,100,200")]
    pub batch_sizes: Vec<usize>,

    /// Pause between a batch insert and its delete (ms)
    #[arg(long, default_value_t = 500)]
    pub insert_pause_ms: u64,

    /// Pause after a delete before the next batch (ms)
    #[arg(long, default_value_t = 500)]
    pub delete_pause_ms: u64,

    /// Period of the widen/narrow schema change pair (ms)
    #[arg(long, default_value_t = 1000)]
    pub ddl_interval_ms: u64,

    #[arg(long, value_enum, default_value_t = TargetColumn::Val0)]
    pub target_column: TargetColumn,

    #[arg(long, default_value = "bigint")]
    pub wide_type: String,

    #[arg(long, default_value = "int")]
    pub narrow_type: String,

    /// Upper bound on any single statement (s)
    #[arg(long, default_value_t = 30)]
    pub statement_timeout_secs: u64,

    /// Seed for batch generation; random (and logged) when omitted
    #[arg(long, env = "HARNESS_SEED")]
    pub seed: Option<u64>,

    /// Create a unique index on val0 so overlapping inserts collide
    #[arg(long, default_value_t = false)]
    pub unique_val0: bool,

    /// Global variables set after the table is created (name=value, comma-separated)
    #[arg(
        long = "global-var",
        value_delimiter = ',',
        default_value = "tidb_ddl_reorg_worker_cnt=1,tidb_ddl_reorg_batch_size=32"
    )]
    pub global_vars: Vec<String>,

    /// Use the existing table as-is
    #[arg(long, default_value_t = false)]
    pub skip_setup: bool,

    /// Run DML workers without the schema mutator
    #[arg(long, default_value_t = false)]
    pub no_ddl: bool,

    #[arg(long, default_value = "info", env = "HARNESS_LOG_LEVEL")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Write a JSON run summary to this file on exit
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

/// Validated, typed view of [`Config`].
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    pub max_connections: usize,
    pub table: TableRef,
    pub workers: usize,
    pub seed: u64,
    pub shape: BatchShape,
    pub timing: CycleTiming,
    pub oscillation: Option<ColumnOscillation>,
    pub setup: Option<SchemaSetup>,
}

impl Config {
    /// Validate and convert. `fallback_seed` is used when no seed was given.
    pub fn harness_settings(&self, fallback_seed: u64) -> Result<HarnessSettings> {
        if self.workers == 0 {
            return Err(HarnessError::config("at least one worker is required"));
        }
        if self.statement_timeout_secs == 0 {
            return Err(HarnessError::config("statement timeout must be positive"));
        }
        validate_identifier("type", &self.wide_type)?;
        validate_identifier("type", &self.narrow_type)?;

        let table = TableRef::new(&self.database, &self.table)?;
        let shape = BatchShape::new(self.batch_sizes.clone(), self.max_value0, self.padding_size)?;
        let statement_timeout = Duration::from_secs(self.statement_timeout_secs);

        let timing = CycleTiming {
            insert_pause: Duration::from_millis(self.insert_pause_ms),
            delete_pause: Duration::from_millis(self.delete_pause_ms),
            statement_timeout,
        };

        let oscillation = (!self.no_ddl).then(|| ColumnOscillation {
            column: self.target_column.as_str().to_string(),
            wide_type: self.wide_type.clone(),
            narrow_type: self.narrow_type.clone(),
            period: Duration::from_millis(self.ddl_interval_ms),
            statement_timeout,
        });

        let setup = if self.skip_setup {
            None
        } else {
            let global_vars = self
                .global_vars
                .iter()
                .filter(|v| !v.trim().is_empty())
                .map(|v| GlobalVar::parse(v))
                .collect::<Result<Vec<_>>>()?;
            Some(SchemaSetup {
                table: table.clone(),
                padding_size: self.padding_size,
                unique_val0: self.unique_val0,
                global_vars,
            })
        };

        Ok(HarnessSettings {
            max_connections: self.max_connections.unwrap_or(self.workers + 2),
            table,
            workers: self.workers,
            seed: self.seed.unwrap_or(fallback_seed),
            shape,
            timing,
            oscillation,
            setup,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["ddl-race-harness"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_reference_workload() {
        let config = parse(&[]);
        let settings = config.harness_settings(99).unwrap();

        assert_eq!(settings.workers, 16);
        assert_eq!(settings.max_connections, 18);
        assert_eq!(settings.seed, 99);
        assert_eq!(settings.shape.batch_sizes(), &[10, 50, 100, 200]);
        assert_eq!(settings.shape.max_value0(), 1000);
        assert_eq!(settings.timing.insert_pause, Duration::from_millis(500));
        assert_eq!(settings.table.to_string(), "`uniq`.`rows`");

        let oscillation = settings.oscillation.unwrap();
        assert_eq!(oscillation.column, "val0");
        assert_eq!(oscillation.wide_type, "bigint");
        assert_eq!(oscillation.narrow_type, "int");
        assert_eq!(oscillation.period, Duration::from_secs(1));

        let setup = settings.setup.unwrap();
        assert_eq!(setup.global_vars.len(), 2);
        assert!(!setup.unique_val0);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--workers",
            "4",
            "--batch-sizes",
            "5,7",
            "--max-value0",
            "20",
            "--seed",
            "7",
            "--target-column",
            "val1",
            "--no-ddl",
            "--skip-setup",
        ]);
        let settings = config.harness_settings(99).unwrap();
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.shape.batch_sizes(), &[5, 7]);
        assert!(settings.oscillation.is_none());
        assert!(settings.setup.is_none());
        assert_eq!(config.target_column.as_str(), "val1");
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(parse(&["--workers", "0"]).harness_settings(1).is_err());
        assert!(parse(&["--batch-sizes", "2000"]).harness_settings(1).is_err());
        assert!(parse(&["--max-value0", "9223372036854775807"]).harness_settings(1).is_err());
        assert!(parse(&["--max-value0", "1000000000"]).harness_settings(1).is_err());
        assert!(parse(&["--table", "rows;"]).harness_settings(1).is_err());
        assert!(parse(&["--wide-type", "bigint unsigned"]).harness_settings(1).is_err());
        assert!(parse(&["--global-var", "oops"]).harness_settings(1).is_err());
    }
}
