//! Aggregate result store
//!
//! Holds every discovered instance and the probe-contributed data merged
//! into it over a run. Instance records are open-ended JSON objects: any
//! probe may add any field, and readers narrow the shapes they expect.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    error::{CollectorError, Result},
    merge::dict_update,
    network::{network_type_of, NetworkType},
};

/// Open-ended per-instance record
pub type Record = Map<String, Value>;

/// Shared handle used by concurrently-running probe tasks within a pass
pub type SharedStore = Arc<RwLock<FleetStore>>;

/// Run-level metadata captured alongside the instances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Unix timestamp taken when the store was created
    pub timestamp: i64,
    /// Resolved IP addresses, keyed by host
    pub ips: Map<String, Value>,
}

/// Lifecycle state of an instance record, derived from its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    /// Not yet probed: no `version`, no `error`
    Pending,
    /// Probed successfully: `version` present, no `error`
    Valid,
    /// A probe recorded an `error`, whatever else is present
    Invalid,
}

impl InstanceState {
    pub fn of(record: &Record) -> Self {
        if record.contains_key("error") {
            Self::Invalid
        } else if record.get("version").map_or(false, |v| !v.is_null()) {
            Self::Valid
        } else {
            Self::Pending
        }
    }
}

/// Filter applied by [`FleetStore::iter_instances`]
#[derive(Debug, Clone)]
pub struct InstanceFilter {
    only_valid: bool,
    valid_or_private: bool,
    network_types: Vec<NetworkType>,
}

impl Default for InstanceFilter {
    fn default() -> Self {
        Self {
            only_valid: false,
            valid_or_private: true,
            network_types: NetworkType::ALL.to_vec(),
        }
    }
}

impl InstanceFilter {
    pub fn with_only_valid(mut self, only_valid: bool) -> Self {
        self.only_valid = only_valid;
        self
    }

    pub fn with_valid_or_private(mut self, valid_or_private: bool) -> Self {
        self.valid_or_private = valid_or_private;
        self
    }

    pub fn with_network_types(mut self, network_types: Vec<NetworkType>) -> Self {
        self.network_types = network_types;
        self
    }
}

/// The aggregate store for one collection run
#[derive(Debug)]
pub struct FleetStore {
    pub metadata: Metadata,
    instances: IndexMap<String, Record>,
    pub engines: Map<String, Value>,
    pub engine_errors: Vec<Value>,
    pub categories: Vec<Value>,
    pub hashes: Vec<Value>,
    pub cidrs: Map<String, Value>,
    pub forks: Vec<String>,
    private: bool,
}

impl FleetStore {
    /// Create an empty store. In private mode, invalid and pending
    /// instances stay visible to filtered iteration.
    pub fn new(private: bool) -> Self {
        Self {
            metadata: Metadata {
                timestamp: chrono::Utc::now().timestamp(),
                ips: Map::new(),
            },
            instances: IndexMap::new(),
            engines: Map::new(),
            engine_errors: Vec::new(),
            categories: Vec::new(),
            hashes: Vec::new(),
            cidrs: Map::new(),
            forks: Vec::new(),
            private,
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Insert a record, overwriting any record already at that URL
    pub fn create_instance(&mut self, url: &str, record: Record) {
        self.instances.insert(url.to_owned(), record);
    }

    /// Look up a record; unknown URLs are a caller bug and propagate
    pub fn get_instance(&self, url: &str) -> Result<&Record> {
        self.instances
            .get(url)
            .ok_or_else(|| CollectorError::instance_not_found(url))
    }

    /// Shallow-merge `partial` into the record at `url`, inserting the
    /// record if the URL is unseen
    pub fn update_instance(&mut self, url: &str, partial: Record) {
        match self.instances.get_mut(url) {
            Some(record) => {
                for (key, value) in partial {
                    record.insert(key, value);
                }
            }
            None => {
                self.instances.insert(url.to_owned(), partial);
            }
        }
    }

    /// Deep-merge `value` into the record at `url` under the nested key
    /// path, inserting an empty record first if the URL is unseen
    pub fn merge_instance_at<S: AsRef<str>>(&mut self, url: &str, keys: &[S], value: Value) {
        let record = self.instances.entry(url.to_owned()).or_default();
        dict_update(record, keys, value);
    }

    /// Record resolved IPs for a host in the metadata lookup cache
    pub fn record_resolved_ips(&mut self, host: &str, ips: Value) {
        self.metadata.ips.insert(host.to_owned(), ips);
    }

    /// Iterate `(url, record)` pairs in insertion order, applying the
    /// filter. Each call restarts from the beginning.
    pub fn iter_instances<'a>(
        &'a self,
        filter: &'a InstanceFilter,
    ) -> impl Iterator<Item = (&'a str, &'a Record)> + 'a {
        self.instances
            .iter()
            .filter(move |(url, record)| {
                let valid = InstanceState::of(record) == InstanceState::Valid;
                if filter.only_valid && !valid {
                    return false;
                }
                if filter.valid_or_private && !self.private && !valid {
                    return false;
                }
                filter.network_types.contains(&network_type_of(url))
            })
            .map(|(url, record)| (url.as_str(), record))
    }

    /// Clone a serializable point-in-time view of the store.
    ///
    /// The `private` flag is run-local control state and is excluded.
    pub fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            metadata: self.metadata.clone(),
            instances: self.instances.clone(),
            engines: self.engines.clone(),
            engine_errors: self.engine_errors.clone(),
            categories: self.categories.clone(),
            hashes: self.hashes.clone(),
            cidrs: self.cidrs.clone(),
            forks: self.forks.clone(),
        }
    }
}

/// Serializable aggregate snapshot written to the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub metadata: Metadata,
    pub instances: IndexMap<String, Record>,
    pub engines: Map<String, Value>,
    pub engine_errors: Vec<Value>,
    pub categories: Vec<Value>,
    pub hashes: Vec<Value>,
    pub cidrs: Map<String, Value>,
    pub forks: Vec<String>,
}
