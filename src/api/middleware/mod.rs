pub mod timing;

pub use timing::{HttpMetrics, TimingMiddleware};
