//! Host resolution probe
//!
//! Resolves every instance's host and records the resulting addresses in
//! the store's metadata IP cache. Lookups are memoized per host through the
//! run cache, so fleets sharing a host resolve it once.

use serde_json::Value;
use std::time::Duration;
use tokio::{net, time::timeout};

use crate::{
    cache::FetchCache,
    config::AppConfig,
    driver::for_each_bounded,
    error::{CollectorError, Result},
    fetcher::{FetchContext, FetchModule},
    network::host_port_of,
    store::InstanceFilter,
};

const CACHE_NS: &str = "resolver";

pub struct ResolverFetcher {
    cache: FetchCache,
    filter: InstanceFilter,
    limit: usize,
    dns_timeout: Duration,
}

impl ResolverFetcher {
    pub fn new(config: &AppConfig, cache: FetchCache) -> Self {
        Self {
            cache,
            filter: InstanceFilter::default().with_valid_or_private(false),
            limit: config.fetching.default_limit,
            dns_timeout: config.dns_timeout(),
        }
    }
}

#[async_trait::async_trait]
impl FetchModule for ResolverFetcher {
    fn id(&self) -> &str {
        CACHE_NS
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<()> {
        let urls: Vec<String> = {
            let store = ctx.store.read().await;
            store
                .iter_instances(&self.filter)
                .map(|(url, _)| url.to_owned())
                .collect()
        };

        let summary = for_each_bounded(urls, self.limit, ctx.cancel.clone(), |url| {
            let store = ctx.store.clone();
            let cache = self.cache.clone();
            let dns_timeout = self.dns_timeout;
            async move {
                let (host, port) = host_port_of(&url)?;
                let ips = match cache.get(CACHE_NS, &host).await {
                    Some(cached) => cached,
                    None => {
                        let resolved =
                            timeout(dns_timeout, net::lookup_host((host.as_str(), port)))
                                .await
                                .map_err(|_| {
                                    CollectorError::timeout("dns_lookup", dns_timeout.as_secs())
                                })?
                                .map_err(|error| CollectorError::network(error.to_string()))?;
                        let mut ips: Vec<String> =
                            resolved.map(|addr| addr.ip().to_string()).collect();
                        ips.sort();
                        ips.dedup();
                        let value = Value::Array(ips.into_iter().map(Value::String).collect());
                        cache.insert(CACHE_NS, &host, value.clone()).await;
                        value
                    }
                };
                store.write().await.record_resolved_ips(&host, ips);
                Ok(())
            }
        })
        .await;

        crate::log_fetch_pass!(CACHE_NS, summary);
        Ok(())
    }
}
