//! Bounded concurrency driver
//!
//! Applies an async operation to every element of a sequence with at most
//! `limit` invocations in flight. One element's failure never aborts the
//! others; the pass completes once every element has been attempted. All
//! interleaving happens cooperatively inside the calling task, so operations
//! for distinct elements never run on different threads simultaneously.

use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::error::Result;

/// Cooperative cancellation flag shared between a pass and its supervisor.
///
/// Once set, invocations already in flight run to completion but no new
/// invocation starts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Outcome counters for one bounded pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Invocations started (equals the sequence length unless cancelled)
    pub attempted: usize,
    /// Invocations that returned an error
    pub failed: usize,
}

/// Run `op` over `items` with at most `limit` invocations in flight.
///
/// Elements are pulled lazily and started in input order; a new invocation
/// starts the moment any single slot frees, so the window slides rather than
/// draining in batches. Failures are counted and logged, never propagated.
pub async fn for_each_bounded<T, F, Fut>(
    items: impl IntoIterator<Item = T>,
    limit: usize,
    cancel: CancelFlag,
    mut op: F,
) -> PassSummary
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let limit = limit.max(1);
    let mut items = items.into_iter();
    let mut in_flight = FuturesUnordered::new();
    let mut summary = PassSummary::default();

    while !cancel.is_cancelled() && in_flight.len() < limit {
        match items.next() {
            Some(item) => {
                summary.attempted += 1;
                in_flight.push(op(item));
            }
            None => break,
        }
    }

    while let Some(outcome) = in_flight.next().await {
        if let Err(error) = outcome {
            summary.failed += 1;
            debug!(error = %error, "operation failed within bounded pass");
        }
        if !cancel.is_cancelled() {
            if let Some(item) = items.next() {
                summary.attempted += 1;
                in_flight.push(op(item));
            }
        }
    }

    summary
}
