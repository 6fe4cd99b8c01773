pub mod demo;
pub mod metrics;

pub use demo::{DemoService, DemoState, demo_routes};
pub use metrics::{MetricsService, MetricsState, SnapshotGuard};
