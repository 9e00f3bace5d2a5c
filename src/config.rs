//! Configuration management
//!
//! Centralized configuration with support for:
//! - TOML configuration files
//! - Environment variable overrides
//! - Command-line overrides applied by the caller

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fetch orchestration settings
    pub fetching: FetchingConfig,
    /// Network timeouts
    pub network: NetworkConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Report output settings
    pub output: OutputConfig,
    /// Seed data for a fresh store
    pub seeds: SeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchingConfig {
    /// Per-fetcher cap on simultaneously in-flight instance probes
    pub default_limit: usize,
    /// User-Agent header sent by HTTP probes
    pub user_agent: String,
    /// Keep invalid and pending instances visible to iteration
    pub private_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Full HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// DNS resolution timeout in seconds
    pub dns_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
    /// Directory for daily-rolling log files (None for console only)
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report path used when the CLI gives none
    pub default_output: PathBuf,
    /// Pretty-print the JSON report
    pub pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Instance URLs probed on every run, merged with CLI seeds
    pub instances: Vec<String>,
    /// Known upstream project repositories
    pub forks: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetching: FetchingConfig {
                default_limit: 8,
                user_agent: format!("fleetstat/{}", env!("CARGO_PKG_VERSION")),
                private_mode: false,
            },
            network: NetworkConfig {
                connect_timeout_secs: 5,
                request_timeout_secs: 20,
                dns_timeout_secs: 10,
            },
            logging: LoggingConfig::default(),
            output: OutputConfig {
                default_output: PathBuf::from("instances.json"),
                pretty: true,
            },
            seeds: SeedConfig {
                instances: Vec::new(),
                forks: vec!["https://github.com/searx/searx".to_string()],
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from file with environment variable overrides
    pub async fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let mut settings = config::Config::builder();

        // Start with default configuration
        settings = settings.add_source(config::Config::try_from(&Self::default())?);

        // Load from config file if it exists
        if config_path.exists() {
            debug!("Found configuration file, loading settings");
            settings = settings.add_source(config::File::from(config_path));
        } else {
            info!("No configuration file found, using defaults");
            Self::create_default_config(config_path).await?;
        }

        // Override with environment variables (prefixed with FLEETSTAT_)
        settings = settings.add_source(
            config::Environment::with_prefix("FLEETSTAT")
                .separator("_")
                .try_parsing(true),
        );

        let config: AppConfig = settings
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration file
    async fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let default_config = Self::default();
        let config_content = toml::to_string_pretty(&default_config)
            .context("Failed to serialize default configuration")?;

        tokio::fs::write(path, config_content)
            .await
            .context("Failed to write default configuration file")?;

        info!("Created default configuration file: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.fetching.default_limit == 0 {
            return Err(anyhow::anyhow!("default_limit must be greater than 0"));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(anyhow::anyhow!("Invalid logging level: {}", self.logging.level)),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => return Err(anyhow::anyhow!("Invalid logging format: {}", self.logging.format)),
        }

        if self.output.default_output.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("default_output must not be empty"));
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    /// Get TCP connect timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.network.connect_timeout_secs)
    }

    /// Get HTTP request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs)
    }

    /// Get DNS timeout as Duration
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.network.dns_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = AppConfig::default();
        config.fetching.default_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "shouting".to_string();
        assert!(config.validate().is_err());
    }
}
