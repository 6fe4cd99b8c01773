//! Prometheus exporter - function instrumentation over the `prometheus` crate
//!
//! Declare counters, gauges, histograms and summaries on an [`Exporter`] and
//! wrap functions with them; each call (or, for deferred metrics, each
//! snapshot) updates the metric. Info gauges and enum state sets are
//! available for values set directly by application code.
//!
//! ```
//! use prometheus_exporter::{Exporter, labels};
//!
//! let exporter = Exporter::builder()
//!     .default_labels(labels! { "service" => "billing" })
//!     .build()
//!     .unwrap();
//!
//! let calls = exporter.counter("invoice_calls", "Invoice calls").build().unwrap();
//! let invoice = calls.wrap(|| 42).unwrap();
//! invoice();
//!
//! let snapshot = exporter.handle(None).unwrap();
//! assert!(snapshot.as_str().contains("invoice_calls{service=\"billing\"} 1"));
//! ```
//!
//! # Features
//! - **server**: HTTP server binary with demo routes (default)
//!
//! # Architecture
//! - `metrics`: metric kinds, registry adapter, summary and enum metrics
//! - `instrument`: function wrappers and the deferred collector set
//! - `exposition`: text and OpenMetrics encoding
//! - `exporter`: the context object and its declaration builders
//! - `config`, `system`: static configuration and logging
//! - `api`, `runtime`: HTTP surface (feature `server`)

pub mod config;
pub mod errors;
pub mod exporter;
pub mod exposition;
pub mod instrument;
pub mod labels;
mod metrics_macros;
pub mod metrics;
pub mod system;

#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "server")]
pub mod cli;
#[cfg(feature = "server")]
pub mod runtime;

pub use errors::{ExporterError, Result};
pub use exporter::{EnumBuilder, Exporter, ExporterBuilder, InfoBuilder, MetricBuilder};
pub use exposition::{ExpositionFormat, Snapshot};
pub use instrument::{Decorator, IntoSample};
pub use labels::{Labels, merge_labels};
pub use metrics::{EnumHandle, MetricHandle, MetricKind, UpdateRule};
