//! Application orchestrator
//!
//! Owns the run lifecycle: seed the store, run every selected fetcher's
//! initialize step once, then run the fetch passes strictly sequentially.
//! Concurrency lives inside a pass, bounded by each probe's own limit. A
//! probe failing never aborts the run; the one fatal condition is a
//! mandatory fetcher failing initialize.

use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    cache::FetchCache,
    cli::Cli,
    config::AppConfig,
    driver::CancelFlag,
    error::{CollectorError, Result},
    fetcher::{FetchContext, Fetcher},
    probes,
    reporting::{self, ReportWriter},
    store::{FleetStore, Record, SharedStore},
};

/// Main application orchestrator
pub struct Application {
    config: AppConfig,
    store: SharedStore,
    cancel: CancelFlag,
    fetchers: Vec<Fetcher>,
    report_writer: Box<dyn ReportWriter + Send + Sync>,
}

impl Application {
    /// Create a new application instance with the default fetcher registry
    pub async fn new(config: AppConfig) -> Result<Self> {
        let cache = FetchCache::new();
        let fetchers = probes::default_fetchers(&config, cache)?;
        let report_writer = reporting::create_report_writer(&config).await?;
        let store = FleetStore::new(config.fetching.private_mode).into_shared();

        Ok(Self {
            config,
            store,
            cancel: CancelFlag::new(),
            fetchers,
            report_writer,
        })
    }

    pub fn fetchers(&self) -> &[Fetcher] {
        &self.fetchers
    }

    /// Run the application with CLI arguments
    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, "Starting collection run");

        if cli.list {
            for fetcher in &self.fetchers {
                match fetcher.group_name() {
                    Some(group) => {
                        println!("{:<16} [{}] {}", fetcher.name(), group, fetcher.help_message())
                    }
                    None => println!("{:<16} {}", fetcher.name(), fetcher.help_message()),
                }
            }
            return Ok(());
        }

        self.seed_store(&cli).await?;
        let selected = self.select_fetchers(&cli)?;

        // Interrupt handling: started probes finish, no new work starts,
        // and the partial report is still written.
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received: finishing in-flight probes, starting no new work");
                cancel.cancel();
            }
        });

        if cli.erase_cache {
            for fetcher in &selected {
                debug!(fetcher = %fetcher.name(), "Erasing memoized results");
                fetcher.erase_cache().await;
            }
        }

        let mut runnable = Vec::new();
        for fetcher in selected {
            match fetcher.initialize().await {
                Ok(()) => runnable.push(fetcher),
                Err(error) if fetcher.is_mandatory() => {
                    return Err(CollectorError::internal(
                        "mandatory_fetcher",
                        format!("{} failed to initialize: {}", fetcher.name(), error),
                    ));
                }
                Err(error) => {
                    crate::log_probe_failure!(fetcher.name(), error);
                    warn!(fetcher = %fetcher.name(), "Skipping fetcher after failed initialize");
                }
            }
        }

        let ctx = FetchContext {
            store: self.store.clone(),
            cancel: self.cancel.clone(),
        };
        for fetcher in &runnable {
            if self.cancel.is_cancelled() {
                warn!("Run cancelled, skipping remaining fetch passes");
                break;
            }
            info!(fetcher = %fetcher.name(), "Starting fetch pass");
            fetcher.fetch(&ctx).await;
        }

        let snapshot = self.store.read().await.snapshot();
        let output_path = cli
            .output
            .clone()
            .unwrap_or_else(|| self.config.output.default_output.clone());
        self.report_writer.write_report(&snapshot, &output_path).await?;

        info!(run_id = %run_id, "Collection run completed");
        Ok(())
    }

    /// Seed the store with instance URLs and the fork list
    async fn seed_store(&self, cli: &Cli) -> Result<()> {
        let mut seeds: Vec<String> = self.config.seeds.instances.clone();
        seeds.extend(cli.instances.iter().cloned());
        if let Some(path) = &cli.instances_file {
            let content = tokio::fs::read_to_string(path).await.map_err(|error| {
                CollectorError::io(format!("reading {}", path.display()), error.to_string())
            })?;
            seeds.extend(
                content
                    .lines()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty() && !line.starts_with('#')),
            );
        }

        let mut store = self.store.write().await;
        store.forks = self.config.seeds.forks.clone();
        for seed in seeds {
            match Url::parse(&seed) {
                // Url normalizes the seed (lowercased host, explicit root path)
                Ok(parsed) => store.create_instance(parsed.as_str(), Record::new()),
                Err(error) => {
                    warn!(url = %seed, error = %error, "Skipping unparseable instance seed")
                }
            }
        }
        if store.instance_count() == 0 {
            warn!("No instance seeds given; the report will be empty");
        }
        Ok(())
    }

    fn select_fetchers(&self, cli: &Cli) -> Result<Vec<&Fetcher>> {
        if cli.fetchers.is_empty() || cli.all {
            return Ok(self.fetchers.iter().collect());
        }
        let mut selected = Vec::new();
        for name in &cli.fetchers {
            match self.fetchers.iter().find(|fetcher| fetcher.name() == name) {
                Some(fetcher) => selected.push(fetcher),
                None => {
                    return Err(CollectorError::validation(
                        "fetcher",
                        format!("unknown fetcher: {name}"),
                    ))
                }
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{sync_fetch, FetchAndMerge};
    use crate::store::InstanceFilter;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn pending_store() -> SharedStore {
        let mut store = FleetStore::new(false);
        store.create_instance("https://u1.example.org/", Record::new());
        store.create_instance("https://u2.example.org/", Record::new());
        store.create_instance("https://u3.example.org/", Record::new());
        store.into_shared()
    }

    #[tokio::test]
    async fn test_end_to_end_two_probes_with_partial_failure() {
        let store = pending_store();
        let cache = FetchCache::new();
        let ctx = FetchContext {
            store: store.clone(),
            cancel: CancelFlag::new(),
        };

        let version = Fetcher::new(
            Arc::new(
                FetchAndMerge::new(
                    "version",
                    &["version"],
                    sync_fetch(|url, _record| {
                        if url.contains("u2") {
                            Err(CollectorError::network("connection refused"))
                        } else {
                            Ok(json!("1.0"))
                        }
                    }),
                )
                .with_filter(InstanceFilter::default().with_valid_or_private(false))
                .with_limit(2),
            ),
            "version",
            "writes version",
            cache.clone(),
        );
        let hash = Fetcher::new(
            Arc::new(
                FetchAndMerge::new(
                    "hash",
                    &["hashes", "sha256"],
                    sync_fetch(|_url, _record| Ok(json!("deadbeef"))),
                )
                .with_filter(InstanceFilter::default().with_valid_or_private(false))
                .with_limit(2),
            ),
            "hash",
            "writes hashes.sha256",
            cache,
        );

        // Passes run sequentially, concurrency only inside each pass
        version.fetch(&ctx).await;
        hash.fetch(&ctx).await;

        let guard = store.read().await;
        for url in ["https://u1.example.org/", "https://u3.example.org/"] {
            let record = guard.get_instance(url).unwrap();
            assert_eq!(record["version"], json!("1.0"));
            assert_eq!(record["hashes"]["sha256"], json!("deadbeef"));
        }
        let failed = guard.get_instance("https://u2.example.org/").unwrap();
        assert!(failed.get("version").is_none());
        assert_eq!(failed["hashes"]["sha256"], json!("deadbeef"));

        // The run still serializes with partial data
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("instances.json");
        let writer = crate::reporting::JsonReportWriter::new(false);
        writer.write_report(&guard.snapshot(), &output_path).await.unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output_path).unwrap()).unwrap();
        assert_eq!(
            parsed["instances"]["https://u2.example.org/"]["hashes"]["sha256"],
            json!("deadbeef")
        );
    }

    #[tokio::test]
    async fn test_select_fetchers_rejects_unknown_names() {
        let config = AppConfig::default();
        let app = Application::new(config).await.unwrap();

        let cli = Cli::parse_from_names(&["no-such-fetcher"]);
        let error = app.select_fetchers(&cli).unwrap_err();
        assert!(matches!(error, CollectorError::Validation { .. }));

        let cli = Cli::parse_from_names(&[]);
        assert_eq!(app.select_fetchers(&cli).unwrap().len(), app.fetchers().len());
    }

    impl Cli {
        fn parse_from_names(names: &[&str]) -> Self {
            use clap::Parser;
            let mut args = vec!["fleetstat"];
            args.extend_from_slice(names);
            Cli::parse_from(args)
        }
    }
}
