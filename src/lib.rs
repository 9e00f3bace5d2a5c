//! # Fleetstat - Fleet Statistics Collector
//!
//! Collects health and metadata statistics about a fleet of
//! independently-operated service instances by running pluggable fetcher
//! probes against each known instance URL and merging their results into
//! one aggregate report.
//!
//! ## Architecture
//!
//! - **Aggregate store** (`store`): the shared, insertion-ordered result
//!   object holding every instance and its probe-contributed record
//! - **Bounded concurrency driver** (`driver`): applies an async operation
//!   to a sequence with at most N invocations in flight, isolating
//!   per-element failures
//! - **Probe adapter** (`fetcher`): wraps a probe module's optional
//!   `initialize`/`fetch` entry points and its cache invalidation
//! - **Fetch-and-merge factory** (`factory`): lifts a per-instance fetch
//!   function into a store-wide, bounded fetch pass
//!
//! Fetch passes run sequentially across probes; concurrency exists only
//! inside a pass, so no two probes ever write the same record at once.

pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod driver;
pub mod error;
pub mod factory;
pub mod fetcher;
pub mod logging;
pub mod merge;
pub mod network;
pub mod probes;
pub mod reporting;
pub mod store;

// Re-exports for convenience
pub use crate::{
    config::AppConfig,
    core::Application,
    error::{CollectorError, Result},
};
