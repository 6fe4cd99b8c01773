//! Deferred collector set
//!
//! Functions declared with `deferred(true)` are not timed at call time.
//! They are called by the snapshot handler instead, and their result (or
//! their duration, for histograms and summaries) becomes the metric value.

use std::any::TypeId;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::metrics::{MetricHandle, UpdateRule};

/// A deferred function, already wrapped to coerce its result.
pub type CollectorFn = dyn Fn() -> Result<f64> + Send + Sync;

/// Identity of a deferred function: the decorator that registered it plus
/// the function's type.
///
/// Only meaningful for zero-sized functions (function items and closures
/// without captures), where the type is the whole function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectorKey {
    owner: u64,
    function: TypeId,
}

impl CollectorKey {
    pub fn new(owner: u64, function: TypeId) -> Self {
        Self { owner, function }
    }
}

struct DeferredEntry {
    id: u64,
    key: Option<CollectorKey>,
    name: String,
    collector: Arc<CollectorFn>,
    rule: UpdateRule,
    metric: MetricHandle,
}

/// Process-wide set of deferred `(function, rule, metric)` entries.
///
/// Entries are never removed; every evaluation calls every function again.
/// Entries added with [`add_once`](Self::add_once) are unique per key.
#[derive(Default)]
pub struct DeferredSet {
    entries: RwLock<Vec<Arc<DeferredEntry>>>,
    next_id: AtomicU64,
    next_owner: AtomicU64,
}

impl DeferredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry and return its id.
    pub fn add(
        &self,
        name: &str,
        collector: Arc<CollectorFn>,
        rule: UpdateRule,
        metric: MetricHandle,
    ) -> u64 {
        let mut entries = self.entries.write();
        self.push(&mut entries, None, name, collector, rule, metric)
    }

    /// Add an entry unless one with the same `key` exists; returns the id
    /// of the entry that holds `key`.
    pub fn add_once(
        &self,
        key: CollectorKey,
        name: &str,
        collector: Arc<CollectorFn>,
        rule: UpdateRule,
        metric: MetricHandle,
    ) -> u64 {
        let mut entries = self.entries.write();
        if let Some(existing) = entries.iter().find(|e| e.key == Some(key)) {
            debug!(
                "Deferred collector #{} already registered for metric '{}'",
                existing.id, name
            );
            return existing.id;
        }
        self.push(&mut entries, Some(key), name, collector, rule, metric)
    }

    /// Allocate an owner id for a decorator.
    pub(crate) fn next_owner(&self) -> u64 {
        self.next_owner.fetch_add(1, Ordering::Relaxed)
    }

    fn push(
        &self,
        entries: &mut Vec<Arc<DeferredEntry>>,
        key: Option<CollectorKey>,
        name: &str,
        collector: Arc<CollectorFn>,
        rule: UpdateRule,
        metric: MetricHandle,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        entries.push(Arc::new(DeferredEntry {
            id,
            key,
            name: name.to_string(),
            collector,
            rule,
            metric,
        }));
        debug!("Deferred collector #{} added for metric '{}'", id, name);
        id
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Call every deferred function and update its metric.
    ///
    /// Functions run in insertion order. Their values are applied only
    /// after all of them succeeded: the first failure is returned and no
    /// deferred metric changes for this evaluation.
    ///
    /// Histograms and summaries observe the time taken by the call and
    /// discard the returned value; the result is still coerced, so a
    /// non-numeric return fails here too. Counters and gauges get the
    /// coerced return value.
    ///
    /// No lock is held while the functions run. Two concurrent evaluations
    /// may interleave their calls and updates.
    pub fn evaluate(&self) -> Result<usize> {
        let entries: Vec<Arc<DeferredEntry>> = self.entries.read().clone();

        let mut pending = Vec::with_capacity(entries.len());
        for entry in &entries {
            let start = Instant::now();
            let value = (entry.collector)().inspect_err(|e| {
                warn!(
                    "Deferred collector #{} for metric '{}' failed: {}",
                    entry.id, entry.name, e
                );
            })?;
            let value = if entry.metric.observes_duration() {
                start.elapsed().as_secs_f64().max(0.0)
            } else {
                value
            };
            pending.push((entry, value));
        }

        for (entry, value) in &pending {
            entry.rule.apply(&entry.metric, *value);
        }

        debug!("Evaluated {} deferred collectors", pending.len());
        Ok(pending.len())
    }
}
