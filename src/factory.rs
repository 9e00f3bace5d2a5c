//! Fetch-and-merge factory
//!
//! Bridges a stateless "given one instance, compute one fragment" function
//! into the store-wide, bounded-concurrency `fetch` contract expected of a
//! probe module. The per-instance function returns a future, so suspending
//! network calls and plain synchronous computations are handled uniformly.

use async_trait::async_trait;
use serde_json::Value;
use std::future::{self, Future};
use tracing::warn;

use crate::{
    driver::for_each_bounded,
    error::Result,
    fetcher::{FetchContext, FetchModule},
    store::{InstanceFilter, Record},
};

/// Probe module built from a per-instance fetch function and a target key
/// path inside the instance record
pub struct FetchAndMerge<F> {
    id: String,
    keys: Vec<String>,
    filter: InstanceFilter,
    limit: usize,
    fetch_one: F,
}

impl<F> FetchAndMerge<F> {
    /// `keys` is the nested path where each instance's fragment lands
    pub fn new(id: impl Into<String>, keys: &[&str], fetch_one: F) -> Self {
        Self {
            id: id.into(),
            keys: keys.iter().map(|key| (*key).to_owned()).collect(),
            filter: InstanceFilter::default(),
            limit: 1,
            fetch_one,
        }
    }

    pub fn with_filter(mut self, filter: InstanceFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Cap on simultaneously in-flight per-instance invocations
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl<F, Fut> FetchModule for FetchAndMerge<F>
where
    F: Fn(String, Record) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, ctx: &FetchContext) -> Result<()> {
        // Working set is fixed up front; the pass parallelizes only across
        // distinct URLs, so no two invocations write the same record.
        let pairs: Vec<(String, Record)> = {
            let store = ctx.store.read().await;
            store
                .iter_instances(&self.filter)
                .map(|(url, record)| (url.to_owned(), record.clone()))
                .collect()
        };

        let summary = for_each_bounded(pairs, self.limit, ctx.cancel.clone(), |(url, record)| {
            let store = ctx.store.clone();
            async move {
                let fragment = (self.fetch_one)(url.clone(), record).await.map_err(|error| {
                    warn!(
                        fetcher = %self.id,
                        url = %url,
                        error = %error,
                        "instance fetch failed"
                    );
                    error
                })?;
                store.write().await.merge_instance_at(&url, &self.keys, fragment);
                Ok(())
            }
        })
        .await;

        crate::log_fetch_pass!(self.id, summary);
        Ok(())
    }
}

/// Adapt a plain synchronous per-instance function to the factory's
/// future-returning contract
pub fn sync_fetch<F>(
    func: F,
) -> impl Fn(String, Record) -> future::Ready<Result<Value>> + Send + Sync
where
    F: Fn(&str, &Record) -> Result<Value> + Send + Sync,
{
    move |url, record| future::ready(func(&url, &record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::CancelFlag;
    use crate::error::CollectorError;
    use crate::store::FleetStore;
    use serde_json::json;

    fn record(fields: Value) -> Record {
        match fields {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn context() -> FetchContext {
        let mut store = FleetStore::new(false);
        store.create_instance("https://u1.example.org/", record(json!({})));
        store.create_instance("https://u2.example.org/", record(json!({})));
        store.create_instance("https://u3.example.org/", record(json!({})));
        FetchContext {
            store: store.into_shared(),
            cancel: CancelFlag::new(),
        }
    }

    #[tokio::test]
    async fn test_merges_fragments_at_key_path() {
        let ctx = context();
        let module = FetchAndMerge::new(
            "version",
            &["version"],
            sync_fetch(|url, _record| Ok(json!(format!("1.0+{url}")))),
        )
        .with_filter(InstanceFilter::default().with_valid_or_private(false))
        .with_limit(2);

        module.fetch(&ctx).await.unwrap();

        let store = ctx.store.read().await;
        let record = store.get_instance("https://u2.example.org/").unwrap();
        assert_eq!(record["version"], json!("1.0+https://u2.example.org/"));
    }

    #[tokio::test]
    async fn test_failed_instance_left_untouched() {
        let ctx = context();
        let module = FetchAndMerge::new(
            "version",
            &["version"],
            sync_fetch(|url, _record| {
                if url.contains("u2") {
                    Err(CollectorError::network("refused"))
                } else {
                    Ok(json!("1.0"))
                }
            }),
        )
        .with_filter(InstanceFilter::default().with_valid_or_private(false))
        .with_limit(2);

        module.fetch(&ctx).await.unwrap();

        let store = ctx.store.read().await;
        assert!(store
            .get_instance("https://u2.example.org/")
            .unwrap()
            .get("version")
            .is_none());
        assert_eq!(
            store.get_instance("https://u1.example.org/").unwrap()["version"],
            json!("1.0")
        );
    }

    #[tokio::test]
    async fn test_suspending_fetch_function() {
        let ctx = context();
        let module = FetchAndMerge::new("timing", &["timing", "initial"], |_url: String, _record: Record| async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            Ok(json!(0.001))
        })
        .with_filter(InstanceFilter::default().with_valid_or_private(false))
        .with_limit(3);

        module.fetch(&ctx).await.unwrap();

        let store = ctx.store.read().await;
        let record = store.get_instance("https://u3.example.org/").unwrap();
        assert_eq!(record["timing"]["initial"], json!(0.001));
    }

    #[tokio::test]
    async fn test_filter_narrows_working_set() {
        let ctx = context();
        {
            let mut store = ctx.store.write().await;
            store.update_instance("https://u1.example.org/", record(json!({"version": "1.0"})));
        }
        let module = FetchAndMerge::new(
            "hash",
            &["hashes", "sha256"],
            sync_fetch(|_url, _record| Ok(json!("ff"))),
        )
        .with_filter(InstanceFilter::default().with_only_valid(true));

        module.fetch(&ctx).await.unwrap();

        let store = ctx.store.read().await;
        assert!(store
            .get_instance("https://u1.example.org/")
            .unwrap()
            .get("hashes")
            .is_some());
        assert!(store
            .get_instance("https://u2.example.org/")
            .unwrap()
            .get("hashes")
            .is_none());
    }
}
