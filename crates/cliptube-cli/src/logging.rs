use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use cliptube_core::config::AppConfig;

/// Log to a daily file in the data dir, and to stderr (warnings only
/// unless `verbose`). `RUST_LOG` overrides the default filter.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = AppConfig::data_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;
    let appender = tracing_appender::rolling::daily(&log_dir, "cliptube.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let default_filter = if verbose {
        "cliptube=debug"
    } else {
        "cliptube=info"
    };
    let env_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(env_filter());

    let stderr_filter = if verbose {
        env_filter()
    } else {
        EnvFilter::new("cliptube=warn")
    };
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), log_dir = %log_dir.display(), "cliptube starting");
    Ok(guard)
}
