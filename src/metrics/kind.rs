//! Metric kinds and per-kind construction parameters

use strum::{AsRefStr, EnumIter};

use crate::errors::{ExporterError, Result};

/// The kinds of metric the exporter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Enum,
    Info,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// Kind-specific construction parameters for decorator-style metrics.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricConfig {
    Counter,
    Gauge,
    /// Upper bounds of the histogram buckets, strictly increasing.
    Histogram { buckets: Vec<f64> },
    /// Exposes `_sum` and `_count` only; no quantiles are computed.
    Summary,
}

impl MetricConfig {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricConfig::Counter => MetricKind::Counter,
            MetricConfig::Gauge => MetricKind::Gauge,
            MetricConfig::Histogram { .. } => MetricKind::Histogram,
            MetricConfig::Summary => MetricKind::Summary,
        }
    }

    /// Histogram configuration using the store's default buckets
    pub fn default_histogram() -> Self {
        MetricConfig::Histogram {
            buckets: prometheus::DEFAULT_BUCKETS.to_vec(),
        }
    }

    /// Check the parameters before anything is handed to the store.
    pub fn validate(&self) -> Result<()> {
        if let MetricConfig::Histogram { buckets } = self {
            validate_buckets(buckets)?;
        }
        Ok(())
    }
}

/// Buckets must be non-empty, finite and strictly increasing.
pub fn validate_buckets(buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(ExporterError::invalid_configuration(
            "histogram requires at least one bucket",
        ));
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err(ExporterError::invalid_configuration(
            "histogram buckets must be finite; +Inf is implicit",
        ));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ExporterError::invalid_configuration(format!(
            "histogram buckets must be strictly increasing: {:?}",
            buckets
        )));
    }
    Ok(())
}
