//! Declaration builders returned by [`Exporter`]

use std::sync::Arc;

use prometheus::{Gauge, Registry};
use tracing::debug;

use super::Exporter;
use crate::errors::{ExporterError, Result};
use crate::instrument::{Decorator, DeferredSet};
use crate::labels::{Labels, merge_labels};
use crate::metrics::kind::validate_buckets;
use crate::metrics::{EnumHandle, MetricConfig, MetricKind, MetricRegistry, UpdateRule};

/// Builds an [`Exporter`].
#[derive(Default)]
pub struct ExporterBuilder {
    default_labels: Labels,
    default_buckets: Option<Vec<f64>>,
    registry: Option<Registry>,
}

impl ExporterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels added to every counter, gauge, histogram and summary.
    pub fn default_labels(mut self, labels: Labels) -> Self {
        self.default_labels = labels;
        self
    }

    pub fn default_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_labels.insert(key.into(), value.into());
        self
    }

    /// Bucket bounds for histograms declared without their own.
    pub fn default_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.default_buckets = Some(buckets);
        self
    }

    /// Expose the collectors of an existing store registry as well.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<Exporter> {
        let default_buckets = match self.default_buckets {
            Some(buckets) => {
                validate_buckets(&buckets)?;
                buckets
            }
            None => prometheus::DEFAULT_BUCKETS.to_vec(),
        };
        let registry = match self.registry {
            Some(registry) => MetricRegistry::with_external(registry),
            None => MetricRegistry::new(),
        };

        debug!(
            "Exporter built with {} default labels",
            self.default_labels.len()
        );
        Ok(Exporter {
            default_labels: self.default_labels,
            default_buckets,
            registry,
            deferred: Arc::new(DeferredSet::new()),
        })
    }
}

/// Declares a counter, gauge, histogram or summary and produces the
/// [`Decorator`] used to wrap functions with it.
#[must_use = "call build() to declare the metric"]
pub struct MetricBuilder<'a> {
    exporter: &'a Exporter,
    kind: MetricKind,
    name: String,
    help: String,
    labels: Labels,
    rule: Option<UpdateRule>,
    deferred: bool,
    buckets: Option<Vec<f64>>,
}

impl<'a> MetricBuilder<'a> {
    pub(crate) fn new(exporter: &'a Exporter, kind: MetricKind, name: &str, help: &str) -> Self {
        Self {
            exporter,
            kind,
            name: name.to_string(),
            help: help.to_string(),
            labels: Labels::new(),
            rule: None,
            deferred: false,
            buckets: None,
        }
    }

    /// Per-metric labels. Exporter default labels override keys they share.
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Replace the default update for this metric's kind.
    pub fn update_rule(mut self, rule: UpdateRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Evaluate wrapped functions at snapshot time instead of on each call.
    pub fn deferred(mut self, deferred: bool) -> Self {
        self.deferred = deferred;
        self
    }

    /// Histogram bucket bounds; other kinds refuse them at `build`.
    pub fn buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = Some(buckets);
        self
    }

    pub fn build(self) -> Result<Decorator> {
        let config = self.config()?;
        let labels = merge_labels(&self.exporter.default_labels, Some(&self.labels));
        let metric = self
            .exporter
            .registry
            .create(&config, &self.name, &self.help, &labels)?;

        Ok(Decorator::new(
            &self.name,
            metric,
            self.rule.unwrap_or_default(),
            self.deferred,
            Arc::clone(&self.exporter.deferred),
        ))
    }

    fn config(&self) -> Result<MetricConfig> {
        match (self.kind, &self.buckets) {
            (MetricKind::Histogram, Some(buckets)) => Ok(MetricConfig::Histogram {
                buckets: buckets.clone(),
            }),
            (MetricKind::Histogram, None) => Ok(MetricConfig::Histogram {
                buckets: self.exporter.default_buckets.clone(),
            }),
            (kind, Some(_)) => Err(ExporterError::invalid_configuration(format!(
                "buckets apply to histograms only, '{}' is a {}",
                self.name, kind
            ))),
            (MetricKind::Counter, None) => Ok(MetricConfig::Counter),
            (MetricKind::Gauge, None) => Ok(MetricConfig::Gauge),
            (MetricKind::Summary, None) => Ok(MetricConfig::Summary),
            (kind, None) => Err(ExporterError::invalid_configuration(format!(
                "'{}' cannot be declared as a {} through a decorator",
                self.name, kind
            ))),
        }
    }
}

/// Declares an info metric: a shared gauge with an initial value.
#[must_use = "call build() to declare the metric"]
pub struct InfoBuilder<'a> {
    exporter: &'a Exporter,
    name: String,
    help: String,
    value: f64,
    labels: Labels,
}

impl<'a> InfoBuilder<'a> {
    pub(crate) fn new(exporter: &'a Exporter, name: &str, help: &str) -> Self {
        Self {
            exporter,
            name: name.to_string(),
            help: help.to_string(),
            value: 0.0,
            labels: Labels::new(),
        }
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    /// Labels for this metric only; exporter default labels are not added.
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn build(self) -> Result<Gauge> {
        self.exporter
            .registry
            .create_info(&self.name, &self.help, self.value, &self.labels)
    }
}

/// Declares an enum metric.
#[must_use = "call build() to declare the metric"]
pub struct EnumBuilder<'a> {
    exporter: &'a Exporter,
    name: String,
    help: String,
    states: Option<Vec<String>>,
    labels: Labels,
}

impl<'a> EnumBuilder<'a> {
    pub(crate) fn new(exporter: &'a Exporter, name: &str, help: &str) -> Self {
        Self {
            exporter,
            name: name.to_string(),
            help: help.to_string(),
            states: None,
            labels: Labels::new(),
        }
    }

    /// Declared states, in order. The enum starts in the first one.
    pub fn states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    /// Labels for this metric only; exporter default labels are not added.
    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn build(self) -> Result<EnumHandle> {
        self.exporter
            .registry
            .create_enum(&self.name, &self.help, self.states, &self.labels)
    }
}
