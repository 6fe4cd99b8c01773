//! The exporter context
//!
//! One [`Exporter`] is built by the hosting process and shared (by
//! reference or `Arc`) with everything that declares metrics or serves
//! snapshots.

mod builders;

pub use builders::{EnumBuilder, ExporterBuilder, InfoBuilder, MetricBuilder};

use std::sync::Arc;

use prometheus::proto::MetricFamily;
use tracing::debug;

use crate::errors::Result;
use crate::exposition::{ExpositionFormat, Snapshot};
use crate::instrument::DeferredSet;
use crate::labels::Labels;
use crate::metrics::{MetricKind, MetricRegistry};

pub struct Exporter {
    pub(crate) default_labels: Labels,
    pub(crate) default_buckets: Vec<f64>,
    pub(crate) registry: MetricRegistry,
    pub(crate) deferred: Arc<DeferredSet>,
}

impl Exporter {
    /// An exporter with no default labels and the store's default buckets
    pub fn new() -> Self {
        Self {
            default_labels: Labels::new(),
            default_buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
            registry: MetricRegistry::new(),
            deferred: Arc::new(DeferredSet::new()),
        }
    }

    pub fn builder() -> ExporterBuilder {
        ExporterBuilder::new()
    }

    pub fn default_labels(&self) -> &Labels {
        &self.default_labels
    }

    pub fn default_buckets(&self) -> &[f64] {
        &self.default_buckets
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn deferred(&self) -> &DeferredSet {
        &self.deferred
    }

    /// Counter; by default each wrapped call adds one.
    pub fn counter(&self, name: &str, help: &str) -> MetricBuilder<'_> {
        MetricBuilder::new(self, MetricKind::Counter, name, help)
    }

    /// Gauge; by default set to the call duration, or to the returned value
    /// when deferred.
    pub fn gauge(&self, name: &str, help: &str) -> MetricBuilder<'_> {
        MetricBuilder::new(self, MetricKind::Gauge, name, help)
    }

    /// Histogram of call durations.
    pub fn histogram(&self, name: &str, help: &str) -> MetricBuilder<'_> {
        MetricBuilder::new(self, MetricKind::Histogram, name, help)
    }

    /// Summary (count and sum) of call durations.
    pub fn summary(&self, name: &str, help: &str) -> MetricBuilder<'_> {
        MetricBuilder::new(self, MetricKind::Summary, name, help)
    }

    /// A gauge that application code sets directly.
    pub fn info(&self, name: &str, help: &str) -> InfoBuilder<'_> {
        InfoBuilder::new(self, name, help)
    }

    /// A state-set metric.
    pub fn enumeration(&self, name: &str, help: &str) -> EnumBuilder<'_> {
        EnumBuilder::new(self, name, help)
    }

    /// Evaluate deferred metrics, then gather the registry.
    pub fn collect(&self) -> Result<Vec<MetricFamily>> {
        self.deferred.evaluate()?;
        Ok(self.registry.gather())
    }

    /// Produce a snapshot of every metric.
    ///
    /// Deferred functions run first; if one fails its error is returned and
    /// no snapshot is produced. The format follows `accept`, an HTTP
    /// `Accept` value.
    ///
    /// This takes no lock of its own. Concurrent calls may interleave their
    /// deferred calls and updates, so callers that need one evaluation at a
    /// time must serialize calls themselves.
    pub fn handle(&self, accept: Option<&str>) -> Result<Snapshot> {
        let format = ExpositionFormat::negotiate(accept);
        let families = self.collect()?;
        let body = format.encode(&families)?;

        debug!(
            "Snapshot of {} metric families encoded as {:?} ({} bytes)",
            families.len(),
            format,
            body.len()
        );
        Ok(Snapshot::new(format, body))
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
