//! Metric registry adapter
//!
//! Creates store metrics for declarations, enforces that each
//! `(name, label keys)` pair is declared once, and gathers everything for
//! exposition.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};
use tracing::debug;

use super::enumeration::EnumHandle;
use super::handle::MetricHandle;
use super::kind::{MetricConfig, MetricKind};
use super::summary::Summary;
use crate::errors::{ExporterError, Result};
use crate::labels::{Labels, label_keys};

/// Identity of a declaration: metric name plus its set of label keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricKey {
    pub name: String,
    pub label_keys: BTreeSet<String>,
}

impl MetricKey {
    pub fn new(name: &str, labels: &Labels) -> Self {
        Self {
            name: name.to_string(),
            label_keys: label_keys(labels),
        }
    }
}

impl std::fmt::Display for MetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.label_keys.iter().map(String::as_str).collect();
        write!(f, "{}{{{}}}", self.name, keys.join(","))
    }
}

struct RegisteredMetric {
    key: MetricKey,
    kind: MetricKind,
    collector: Box<dyn Collector>,
}

/// Registry adapter over the `prometheus` store.
///
/// Declarations are kept here rather than in a `prometheus::Registry`
/// because the store refuses a second family with the same name and a
/// different label-name set, which declarations are allowed to do. Families
/// sharing a name are merged when gathered.
pub struct MetricRegistry {
    metrics: RwLock<Vec<RegisteredMetric>>,
    external: Option<Registry>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            metrics: RwLock::new(Vec::new()),
            external: None,
        }
    }

    /// Also expose every collector registered with `registry`.
    pub fn with_external(registry: Registry) -> Self {
        Self {
            metrics: RwLock::new(Vec::new()),
            external: Some(registry),
        }
    }

    /// The caller-supplied store registry, if any
    pub fn external(&self) -> Option<&Registry> {
        self.external.as_ref()
    }

    /// Store a collector under `key`.
    pub fn register(
        &self,
        key: MetricKey,
        kind: MetricKind,
        collector: Box<dyn Collector>,
    ) -> Result<()> {
        let mut metrics = self.metrics.write();

        if metrics.iter().any(|m| m.key == key) {
            return Err(ExporterError::duplicate_metric(format!(
                "metric '{}' is already registered",
                key
            )));
        }
        if let Some(existing) = metrics
            .iter()
            .find(|m| m.key.name == key.name && m.kind != kind)
        {
            return Err(ExporterError::invalid_configuration(format!(
                "metric '{}' is already registered as a {}, cannot declare it as a {}",
                key.name, existing.kind, kind
            )));
        }
        let names = exposition_names(kind, &key.name);
        if let Some(existing) = metrics.iter().find(|m| {
            m.key.name != key.name
                && exposition_names(m.kind, &m.key.name)
                    .iter()
                    .any(|n| names.contains(n))
        }) {
            return Err(ExporterError::invalid_configuration(format!(
                "metric '{}' collides with {} '{}' in the OpenMetrics exposition",
                key.name, existing.kind, existing.key.name
            )));
        }

        debug!("Registered {} metric {}", kind, key);
        metrics.push(RegisteredMetric {
            key,
            kind,
            collector,
        });
        Ok(())
    }

    pub fn contains(&self, key: &MetricKey) -> bool {
        self.metrics.read().iter().any(|m| &m.key == key)
    }

    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }

    /// Create and register a decorator-style metric.
    ///
    /// The store metric is built with the label keys; the label values are
    /// then bound once, so the returned handle carries them.
    pub fn create(
        &self,
        config: &MetricConfig,
        name: &str,
        help: &str,
        labels: &Labels,
    ) -> Result<MetricHandle> {
        config.validate()?;
        let key = MetricKey::new(name, labels);
        self.ensure_vacant(&key)?;

        let keys: Vec<&str> = labels.keys().map(String::as_str).collect();
        let values: Vec<&str> = labels.values().map(String::as_str).collect();

        let (handle, collector): (MetricHandle, Box<dyn Collector>) = match config {
            MetricConfig::Counter => {
                let opts = Opts::new(name, help);
                if keys.is_empty() {
                    let counter = Counter::with_opts(opts)?;
                    (MetricHandle::Counter(counter.clone()), Box::new(counter))
                } else {
                    let vec = CounterVec::new(opts, &keys)?;
                    let counter = vec.get_metric_with_label_values(&values[..])?;
                    (MetricHandle::Counter(counter), Box::new(vec))
                }
            }
            MetricConfig::Gauge => {
                let opts = Opts::new(name, help);
                if keys.is_empty() {
                    let gauge = Gauge::with_opts(opts)?;
                    (MetricHandle::Gauge(gauge.clone()), Box::new(gauge))
                } else {
                    let vec = GaugeVec::new(opts, &keys)?;
                    let gauge = vec.get_metric_with_label_values(&values[..])?;
                    (MetricHandle::Gauge(gauge), Box::new(vec))
                }
            }
            MetricConfig::Histogram { buckets } => {
                let opts = HistogramOpts::new(name, help).buckets(buckets.clone());
                if keys.is_empty() {
                    let histogram = Histogram::with_opts(opts)?;
                    (MetricHandle::Histogram(histogram.clone()), Box::new(histogram))
                } else {
                    let vec = HistogramVec::new(opts, &keys)?;
                    let histogram = vec.get_metric_with_label_values(&values[..])?;
                    (MetricHandle::Histogram(histogram), Box::new(vec))
                }
            }
            MetricConfig::Summary => {
                let summary = Summary::new(name, help, labels)?;
                (MetricHandle::Summary(summary.clone()), Box::new(summary))
            }
        };

        self.register(key, config.kind(), collector)?;
        Ok(handle)
    }

    /// Create and register a free-standing gauge initialised to `value`.
    pub fn create_info(&self, name: &str, help: &str, value: f64, labels: &Labels) -> Result<Gauge> {
        let key = MetricKey::new(name, labels);
        self.ensure_vacant(&key)?;

        let opts = Opts::new(name, help);
        let (gauge, collector): (Gauge, Box<dyn Collector>) = if labels.is_empty() {
            let gauge = Gauge::with_opts(opts)?;
            (gauge.clone(), Box::new(gauge))
        } else {
            let keys: Vec<&str> = labels.keys().map(String::as_str).collect();
            let values: Vec<&str> = labels.values().map(String::as_str).collect();
            let vec = GaugeVec::new(opts, &keys)?;
            (vec.get_metric_with_label_values(&values[..])?, Box::new(vec))
        };
        gauge.set(value);

        // Info metrics are plain gauges in the exposition.
        self.register(key, MetricKind::Gauge, collector)?;
        Ok(gauge)
    }

    /// Create and register an enum metric.
    pub fn create_enum(
        &self,
        name: &str,
        help: &str,
        states: Option<Vec<String>>,
        labels: &Labels,
    ) -> Result<EnumHandle> {
        let key = MetricKey::new(name, labels);
        self.ensure_vacant(&key)?;

        let handle = EnumHandle::new(name, help, states, labels)?;
        self.register(key, MetricKind::Enum, Box::new(handle.clone()))?;
        Ok(handle)
    }

    /// Gather every registered metric, merged by family name and sorted.
    pub fn gather(&self) -> Vec<MetricFamily> {
        let mut collected: Vec<MetricFamily> = self
            .metrics
            .read()
            .iter()
            .flat_map(|m| m.collector.collect())
            .collect();
        if let Some(registry) = &self.external {
            collected.extend(registry.gather());
        }

        let mut families: BTreeMap<String, MetricFamily> = BTreeMap::new();
        for mut family in collected {
            if family.get_metric().is_empty() {
                continue;
            }
            match families.entry(family.name().to_string()) {
                Entry::Vacant(entry) => {
                    entry.insert(family);
                }
                Entry::Occupied(mut entry) => {
                    entry.get_mut().mut_metric().extend(family.take_metric());
                }
            }
        }
        families.into_values().collect()
    }

    // Checked before the store metric is built so a duplicate declaration
    // never leaves a half-initialised metric behind. `register` re-checks
    // under the write lock.
    fn ensure_vacant(&self, key: &MetricKey) -> Result<()> {
        if self.contains(key) {
            return Err(ExporterError::duplicate_metric(format!(
                "metric '{}' is already registered",
                key
            )));
        }
        Ok(())
    }
}

/// Names a metric occupies in the OpenMetrics exposition: a counter's
/// family drops `_total` and its samples carry it.
fn exposition_names(kind: MetricKind, name: &str) -> Vec<String> {
    match kind {
        MetricKind::Counter => {
            let family = name.strip_suffix("_total").unwrap_or(name);
            vec![family.to_string(), format!("{}_total", family)]
        }
        _ => vec![name.to_string()],
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}
