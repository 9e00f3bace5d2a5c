//! Logging and observability
//!
//! Structured logging with:
//! - Multiple output formats (JSON, pretty)
//! - Optional daily-rolling log file
//! - Event macros for probe failures and pass completion

use anyhow::{Context, Result};
use std::io;
use tracing::{info, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::{config::LoggingConfig, error::CollectorError};

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<Option<WorkerGuard>> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with specific configuration.
///
/// Returns the file writer's guard when a log directory is configured; the
/// caller keeps it alive for the duration of the process.
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = create_env_filter(&config.level)?;
    let registry = Registry::default().with(env_filter);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = rolling::daily(dir, "fleetstat.log");
            let (writer, guard) = non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = match config.format.as_str() {
        "json" => fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_target(true)
            .boxed(),
        _ => fmt::layer()
            .pretty()
            .with_writer(io::stderr)
            .with_target(false)
            .boxed(),
    };
    registry.with(console_layer).with(file_layer).init();

    info!("Logging system initialized with level: {}", config.level);
    Ok(guard)
}

/// Create environment filter from log level string
fn create_env_filter(level: &str) -> Result<EnvFilter> {
    let base_level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => return Err(CollectorError::config(format!("Invalid log level: {}", level)).into()),
    };

    let filter = EnvFilter::builder()
        .with_default_directive(base_level.into())
        .from_env()
        .context("Failed to create environment filter")?
        .add_directive("hyper=info".parse()?)
        .add_directive("reqwest=info".parse()?);

    Ok(filter)
}

/// A fetcher's task raised an error that was caught at the task boundary
#[macro_export]
macro_rules! log_probe_failure {
    ($fetcher:expr, $error:expr) => {
        tracing::error!(
            fetcher = %$fetcher,
            error = %$error,
            event = "probe_failure",
            "Fetcher {} failed: {}",
            $fetcher,
            $error
        );
    };
}

/// One bounded fetch pass finished
#[macro_export]
macro_rules! log_fetch_pass {
    ($fetcher:expr, $summary:expr) => {
        tracing::info!(
            fetcher = %$fetcher,
            attempted = $summary.attempted,
            failed = $summary.failed,
            event = "fetch_pass",
            "Fetch pass {} complete: {} attempted, {} failed",
            $fetcher,
            $summary.attempted,
            $summary.failed
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_creation() {
        let filter = create_env_filter("info");
        assert!(filter.is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let filter = create_env_filter("invalid");
        assert!(filter.is_err());
    }
}
