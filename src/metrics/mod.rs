//! Metric declarations backed by the `prometheus` store
//!
//! Kinds, label-bound handles, the registry adapter and the two metric
//! types the store does not provide (summary and enum).

pub mod enumeration;
pub mod handle;
pub mod kind;
mod registry;
pub mod summary;

pub use enumeration::EnumHandle;
pub use handle::{MetricHandle, UpdateRule};
pub use kind::{MetricConfig, MetricKind};
pub use registry::{MetricKey, MetricRegistry};
pub use summary::Summary;
