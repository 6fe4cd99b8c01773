//! HTTP surface of the bundled server
//!
//! The metrics endpoint, the demo routes and the timing middleware.

pub mod middleware;
pub mod services;

use actix_web::web;

use services::{MetricsService, demo_routes};

/// Register the metrics endpoint at `metrics_path` and the demo routes.
///
/// Expects `MetricsState` and `DemoState` to be registered as app data.
pub fn configure_routes(cfg: &mut web::ServiceConfig, metrics_path: &str) {
    cfg.route(metrics_path, web::get().to(MetricsService::metrics));
    demo_routes(cfg);
}
