//! Label-bound metric handles and the update rules applied to them

use std::fmt;
use std::sync::Arc;

use prometheus::{Counter, Gauge, Histogram};

use super::kind::MetricKind;
use super::summary::Summary;

/// A declared metric with its label values already bound.
///
/// Cloning is cheap: every variant shares the underlying store metric.
#[derive(Clone)]
pub enum MetricHandle {
    Counter(Counter),
    Gauge(Gauge),
    Histogram(Histogram),
    Summary(Summary),
}

impl MetricHandle {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricHandle::Counter(_) => MetricKind::Counter,
            MetricHandle::Gauge(_) => MetricKind::Gauge,
            MetricHandle::Histogram(_) => MetricKind::Histogram,
            MetricHandle::Summary(_) => MetricKind::Summary,
        }
    }

    /// Whether deferred evaluation records call duration instead of the
    /// function's return value.
    pub fn observes_duration(&self) -> bool {
        matches!(self, MetricHandle::Histogram(_) | MetricHandle::Summary(_))
    }

    pub fn as_counter(&self) -> Option<&Counter> {
        match self {
            MetricHandle::Counter(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_gauge(&self) -> Option<&Gauge> {
        match self {
            MetricHandle::Gauge(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&Histogram> {
        match self {
            MetricHandle::Histogram(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_summary(&self) -> Option<&Summary> {
        match self {
            MetricHandle::Summary(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for MetricHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MetricHandle").field(&self.kind()).finish()
    }
}

type RuleFn = dyn Fn(&MetricHandle, f64) + Send + Sync;

/// The update applied to a metric each time its wrapped function reports a
/// value (elapsed seconds, or the coerced return value when deferred).
#[derive(Clone)]
pub struct UpdateRule(Arc<RuleFn>);

impl UpdateRule {
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(&MetricHandle, f64) + Send + Sync + 'static,
    {
        Self(Arc::new(rule))
    }

    pub fn apply(&self, metric: &MetricHandle, value: f64) {
        (self.0)(metric, value)
    }
}

impl Default for UpdateRule {
    /// Counter: increment by one, ignoring the value. Gauge: set the value.
    /// Histogram and summary: observe the value.
    fn default() -> Self {
        Self::new(|metric, value| match metric {
            MetricHandle::Counter(c) => c.inc(),
            MetricHandle::Gauge(g) => g.set(value),
            MetricHandle::Histogram(h) => h.observe(value),
            MetricHandle::Summary(s) => s.observe(value),
        })
    }
}

impl fmt::Debug for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UpdateRule")
    }
}
