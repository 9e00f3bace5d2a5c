//! Probe adapter
//!
//! Wraps a probe module's optional `initialize`/`fetch` entry points into
//! units of work the orchestrator can run, and exposes invalidation of the
//! probe's memoized results.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::{
    cache::FetchCache,
    driver::CancelFlag,
    error::Result,
    store::SharedStore,
};

/// Everything a fetch pass needs from the surrounding run
#[derive(Clone)]
pub struct FetchContext {
    pub store: SharedStore,
    pub cancel: CancelFlag,
}

/// A probe module: a capability set, not a base class.
///
/// Both entry points are optional; the defaults are no-ops so a module
/// implements only what it provides.
#[async_trait]
pub trait FetchModule: Send + Sync {
    /// Stable identity, also the module's cache namespace
    fn id(&self) -> &str;

    /// One-time setup before any fetch pass runs
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// One store-wide fetch pass
    async fn fetch(&self, _ctx: &FetchContext) -> Result<()> {
        Ok(())
    }
}

/// Descriptor and adapter for one registered probe
pub struct Fetcher {
    module: Arc<dyn FetchModule>,
    name: String,
    help_message: String,
    group_name: Option<String>,
    mandatory: bool,
    cache: FetchCache,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("name", &self.name)
            .field("help_message", &self.help_message)
            .field("group_name", &self.group_name)
            .field("mandatory", &self.mandatory)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    pub fn new(
        module: Arc<dyn FetchModule>,
        name: impl Into<String>,
        help_message: impl Into<String>,
        cache: FetchCache,
    ) -> Self {
        Self {
            module,
            name: name.into(),
            help_message: help_message.into(),
            group_name: None,
            mandatory: false,
            cache,
        }
    }

    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = Some(group_name.into());
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help_message(&self) -> &str {
        &self.help_message
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Run the module's initialize step. Errors propagate so the call site
    /// can decide whether a mandatory probe failing aborts the run.
    pub async fn initialize(&self) -> Result<()> {
        debug!(fetcher = %self.name, "running initialize");
        self.module.initialize().await
    }

    /// Run one fetch pass. Any error raised inside the module is caught,
    /// logged with the fetcher's name, and converted into a non-fatal
    /// outcome; a single probe's failure never aborts the run.
    pub async fn fetch(&self, ctx: &FetchContext) {
        if let Err(error) = self.module.fetch(ctx).await {
            crate::log_probe_failure!(self.name, error);
        }
    }

    /// Invalidate this probe's memoized results. Other probes' cache
    /// namespaces are untouched.
    pub async fn erase_cache(&self) {
        self.cache.erase_by_name(self.module.id()).await;
    }
}
