use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::HarnessSettings;
use crate::stats::StatsSnapshot;

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub version: String,
    pub started_at: String,
    pub finished_at: String,
    pub outcome: String,
    pub settings: ReportSettings,
    pub stats: StatsSnapshot,
}

/// Settings worth keeping next to the numbers. The store URL is left out
/// since it may carry credentials.
#[derive(Debug, Serialize)]
pub struct ReportSettings {
    pub table: String,
    pub workers: usize,
    pub seed: u64,
    pub batch_sizes: Vec<usize>,
    pub max_value0: i64,
    pub padding_size: usize,
    pub insert_pause_ms: u64,
    pub delete_pause_ms: u64,
    pub ddl: Option<String>,
}

impl RunReport {
    pub fn new(
        settings: &HarnessSettings,
        started_at: chrono::DateTime<chrono::Utc>,
        outcome: impl Into<String>,
        stats: StatsSnapshot,
    ) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: started_at.to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            outcome: outcome.into(),
            settings: ReportSettings {
                table: settings.table.to_string(),
                workers: settings.workers,
                seed: settings.seed,
                batch_sizes: settings.shape.batch_sizes().to_vec(),
                max_value0: settings.shape.max_value0(),
                padding_size: settings.shape.padding_size(),
                insert_pause_ms: settings.timing.insert_pause.as_millis() as u64,
                delete_pause_ms: settings.timing.delete_pause.as_millis() as u64,
                ddl: settings.oscillation.as_ref().map(|o| {
                    format!(
                        "{} {} <-> {} every {}ms",
                        o.column,
                        o.wide_type,
                        o.narrow_type,
                        o.period.as_millis()
                    )
                }),
            },
            stats,
        }
    }
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_json_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}
