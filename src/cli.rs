//! Command-line interface definition
//!
//! Argument parsing for fetcher selection, instance seeding, output control
//! and configuration overrides.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fleetstat",
    about = "Health and metadata statistics collector for fleets of service instances",
    long_about = "Runs pluggable fetcher probes against every known instance URL with bounded \
                  concurrency and merges the results into one aggregate JSON report"
)]
pub struct Cli {
    /// Fetchers to run by name (default: all registered fetchers)
    pub fetchers: Vec<String>,

    #[arg(long, help = "Run every registered fetcher (the default when no names are given)")]
    pub all: bool,

    #[arg(long, help = "List available fetchers and exit")]
    pub list: bool,

    // Instance seeding
    #[arg(
        short = 'i',
        long = "instance",
        value_name = "URL",
        help = "Seed instance URL (repeatable)"
    )]
    pub instances: Vec<String>,

    #[arg(
        long,
        value_name = "FILE",
        help = "File with one instance URL per line ('#' starts a comment)"
    )]
    pub instances_file: Option<PathBuf>,

    // Run behavior
    #[arg(
        long,
        help = "Private mode: keep invalid and pending instances visible to probes and the report"
    )]
    pub private: bool,

    #[arg(
        long,
        value_name = "N",
        help = "Override the per-fetcher concurrency limit"
    )]
    pub limit: Option<usize>,

    #[arg(long, help = "Erase each selected fetcher's memoized results before running")]
    pub erase_cache: bool,

    // Output
    #[arg(short = 'o', long, value_name = "FILE", help = "Report output path")]
    pub output: Option<PathBuf>,

    // Configuration
    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        default_value = "config.toml",
        help = "Configuration file path"
    )]
    pub config_path: PathBuf,

    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetcher_selection() {
        let cli = Cli::parse_from(["fleetstat", "version", "resolver", "-i", "https://a.example/"]);
        assert_eq!(cli.fetchers, vec!["version", "resolver"]);
        assert_eq!(cli.instances, vec!["https://a.example/"]);
        assert!(!cli.private);
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["fleetstat"]);
        assert!(cli.fetchers.is_empty());
        assert_eq!(cli.config_path, PathBuf::from("config.toml"));
        assert!(cli.output.is_none());
    }
}
