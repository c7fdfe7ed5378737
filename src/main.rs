//! Flowcron - cron-style job scheduler for Docker Swarm services
//!
//! Main entry point for the Flowcron service.

mod cli;
mod server;
mod shutdown;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use flowcron_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use crate::cli::Cli;

/// Initialize tracing with console output and, when configured, a daily
/// rolling log file.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let file = match &logging.dir {
        Some(dir) => Some(file_layer(dir)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file)
        .init();

    Ok(())
}

fn file_layer<S>(dir: &Path) -> anyhow::Result<Box<dyn Layer<S> + Send + Sync>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("flowcron")
        .filename_suffix("log")
        .max_log_files(30)
        .build(dir)
        .context("Failed to create log file appender")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes pending lines on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    Ok(fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .boxed())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    cli.apply(&mut config);
    ConfigValidator::validate(&config).into_result()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.logging)?;

    info!(
        "Starting Flowcron {} (config: {})",
        env!("CARGO_PKG_VERSION"),
        cli.config.display()
    );

    server::run_service(config, cli.dry_run).await
}
