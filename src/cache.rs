//! Run-scoped memoization cache for probe results
//!
//! Cached entries are namespaced by probe identity so one probe's
//! invalidation can never evict another's. The cache is an explicit
//! instance created per run and handed to each fetcher at construction.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Namespaces = HashMap<String, HashMap<String, Value>>;

/// Clonable handle to the per-run cache
#[derive(Debug, Clone, Default)]
pub struct FetchCache {
    entries: Arc<RwLock<Namespaces>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        self.entries
            .read()
            .await
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned()
    }

    pub async fn insert(&self, namespace: &str, key: &str, value: Value) {
        self.entries
            .write()
            .await
            .entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), value);
    }

    /// Drop every entry cached under `namespace`. Erasing a namespace that
    /// was never populated is a no-op, not an error.
    pub async fn erase_by_name(&self, namespace: &str) {
        self.entries.write().await.remove(namespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_roundtrip() {
        let cache = FetchCache::new();
        cache.insert("version", "https://a.example/", json!("1.0")).await;
        assert_eq!(
            cache.get("version", "https://a.example/").await,
            Some(json!("1.0"))
        );
        assert_eq!(cache.get("version", "https://b.example/").await, None);
    }

    #[tokio::test]
    async fn test_erase_scoped_to_namespace() {
        let cache = FetchCache::new();
        cache.insert("probe_a", "k", json!(1)).await;
        cache.insert("probe_b", "k", json!(2)).await;

        cache.erase_by_name("probe_a").await;

        assert_eq!(cache.get("probe_a", "k").await, None);
        assert_eq!(cache.get("probe_b", "k").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn test_erase_unknown_namespace_is_noop() {
        let cache = FetchCache::new();
        cache.erase_by_name("never-populated").await;
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let cache = FetchCache::new();
        let other = cache.clone();
        cache.insert("ns", "k", json!(true)).await;
        assert_eq!(other.get("ns", "k").await, Some(json!(true)));
    }
}
