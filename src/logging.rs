// Logging module, powered by tracing-subscriber
//
// Library code logs through the `log` facade; `tracing_log::LogTracer`
// forwards those records into the tracing subscriber installed here.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LogFormat;

/// Build the `EnvFilter` from the base level plus noisy-crate overrides.
fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let mut directives = vec![level.to_string()];

    // Suppress noisy third-party crates
    let noisy: &[(&str, &str)] = &[("mysql_async", "warn"), ("mysql_common", "warn")];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", filter_str, e))
}

/// Install the console subscriber.
pub fn init_logging(level: &str, format: LogFormat) -> anyhow::Result<()> {
    // Bridge `log` crate → tracing
    tracing_log::LogTracer::init().ok(); // ok() in case already initialized

    let console_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_filter(build_env_filter(level)?)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(true)
            .with_target(false)
            .with_filter(build_env_filter(level)?)
            .boxed(),
    };

    tracing_subscriber::registry().with(console_layer).try_init()?;

    tracing::trace!("Logging initialized: level={}, format={:?}", level, format);
    Ok(())
}
