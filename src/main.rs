use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};

use ddl_race_harness::config::Config;
use ddl_race_harness::logging;
use ddl_race_harness::report::{self, RunReport};
use ddl_race_harness::{
    ErrorClassifier, HarnessError, MySqlStore, Orchestrator, Store, WorkerPool,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    if let Err(e) = logging::init_logging(&config.log_level, config.log_format) {
        eprintln!("❌ FATAL: Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let settings = config.harness_settings(rand::random())?;

    println!("╔════════════════════════════════════════════════╗");
    println!("║          DDL Race Harness v{:<20}║", env!("CARGO_PKG_VERSION"));
    println!("╚════════════════════════════════════════════════╝");
    println!();
    println!("  Table:       {}", settings.table);
    println!("  Workers:     {}", settings.workers);
    println!("  Batches:     {:?} over val0 in [0, {})", settings.shape.batch_sizes(), settings.shape.max_value0());
    println!("  Seed:        {}", settings.seed);
    match settings.oscillation {
        Some(ref o) => println!(
            "  DDL:         {} {} <-> {} every {}ms",
            o.column,
            o.wide_type,
            o.narrow_type,
            o.period.as_millis()
        ),
        None => println!("  DDL:         disabled"),
    }
    println!();

    let store = MySqlStore::connect(&config.url, settings.max_connections)
        .context("Failed to configure store connection")?;
    store
        .ping()
        .await
        .with_context(|| format!("Failed to reach store at {}", redact_url(&config.url)))?;
    info!("Successfully connected to store");

    if let Some(ref setup) = settings.setup {
        setup.apply(&store).await?;
    } else {
        info!("Skipping schema setup, using existing table {}", settings.table);
    }

    let shared: Arc<dyn Store> = Arc::new(store.clone());
    let pool = WorkerPool::new(
        settings.workers,
        settings.seed,
        settings.shape.clone(),
        settings.table.clone(),
        settings.timing,
    );
    let orchestrator = Orchestrator::new(
        shared,
        ErrorClassifier::tidb(),
        pool,
        settings.table.clone(),
        settings.oscillation.clone(),
    );

    let started_at = chrono::Utc::now();
    let outcome = orchestrator
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    let snapshot = orchestrator.stats().snapshot();
    println!("\n════════════════════════════════════════════════");
    println!("{}", snapshot.render());
    println!("════════════════════════════════════════════════\n");

    if let Some(ref path) = config.summary_json {
        let label = match &outcome {
            Ok(()) => "stopped".to_string(),
            Err(HarnessError::FatalRace { .. }) => "fatal race".to_string(),
            Err(e) => format!("error: {}", e),
        };
        let run_report = RunReport::new(&settings, started_at, label, snapshot);
        match report::write_json_report(&run_report, path) {
            Ok(()) => println!("  JSON report: {}", path.display()),
            Err(e) => eprintln!("  Failed to write JSON report: {}", e),
        }
    }

    if let Err(e) = store.disconnect().await {
        warn!("Failed to close store connections: {}", e);
    }

    if let Err(ref e) = outcome {
        if e.is_fatal_race() {
            error!("Replay with --seed {} to reproduce the generated batches", settings.seed);
        }
    }
    outcome.map_err(anyhow::Error::from)
}

/// Strip the password from a connection URL before logging it.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let userinfo = &url[scheme_end + 3..at];
            match userinfo.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}
