//! Fleetstat - Fleet Statistics Collector
//!
//! Main entry point. Parses the CLI, loads configuration, initializes
//! logging and runs the collection.

use anyhow::Result;
use clap::Parser;
use fleetstat::{cli::Cli, config::AppConfig, core::Application, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config_path).await?;

    // CLI flags override file/environment configuration
    if cli.private {
        config.fetching.private_mode = true;
    }
    if let Some(limit) = cli.limit {
        config.fetching.default_limit = limit;
    }
    config.validate()?;

    // Keep the file-appender guard alive for the whole run
    let _log_guard = logging::init_logging_with_config(&config.logging)?;

    if cli.validate_config {
        info!("Configuration is valid");
        return Ok(());
    }

    let mut app = Application::new(config).await?;
    app.run(cli).await?;

    info!("Application completed successfully");
    Ok(())
}
