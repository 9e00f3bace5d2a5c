//! Built-in probes
//!
//! Each probe is deliberately thin: the orchestration engine treats probes
//! as opaque modules, and these exist to exercise it end to end. Protocol
//! logic beyond "fetch one fragment per instance" belongs elsewhere.

pub mod resolver;
pub mod response_time;
pub mod version;

use std::sync::Arc;

use crate::{cache::FetchCache, config::AppConfig, error::Result, fetcher::Fetcher};

/// The registry of probes shipped with the collector
pub fn default_fetchers(config: &AppConfig, cache: FetchCache) -> Result<Vec<Fetcher>> {
    Ok(vec![
        Fetcher::new(
            Arc::new(version::version_fetcher(config)?),
            "version",
            "Detect the software version exposed by each instance",
            cache.clone(),
        )
        .with_group("core")
        .with_mandatory(true),
        Fetcher::new(
            Arc::new(response_time::response_time_fetcher(config)),
            "response-time",
            "Measure initial TCP connect latency of each valid instance",
            cache.clone(),
        )
        .with_group("timing"),
        Fetcher::new(
            Arc::new(resolver::ResolverFetcher::new(config, cache.clone())),
            "resolver",
            "Resolve instance hosts and record their IP addresses",
            cache,
        )
        .with_group("network"),
    ])
}
