//! Server mode
//!
//! Builds the exporter from configuration, registers the HTTP and demo
//! metrics, and serves them with actix-web.

use actix_web::{App, HttpServer, middleware::DefaultHeaders, web};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::configure_routes;
use crate::api::middleware::{HttpMetrics, TimingMiddleware};
use crate::api::services::{DemoState, MetricsState};
use crate::config::StaticConfig;

/// Run the HTTP server until it is stopped
///
/// **Note**: Logging must be initialized before calling this function.
pub async fn run_server(config: StaticConfig) -> Result<()> {
    let server_config = config.server;

    let exporter = Arc::new(
        config
            .exporter
            .build_exporter()
            .context("Invalid exporter configuration")?,
    );

    let http_metrics = if server_config.http_metrics {
        Some(HttpMetrics::register(&exporter).context("Failed to register HTTP metrics")?)
    } else {
        info!("HTTP request metrics disabled");
        None
    };

    let demo = DemoState::register(
        &exporter,
        Duration::from_secs(server_config.enum_demo_secs),
    )
    .context("Failed to register demo metrics")?;

    let metrics_state = MetricsState::new(Arc::clone(&exporter), server_config.serialize_snapshots);
    if !server_config.serialize_snapshots {
        warn!("Snapshot serialization disabled: concurrent scrapes may interleave deferred metrics");
    }

    let metrics_path = server_config.metrics_path.clone();
    let cpu_count = server_config.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let server = HttpServer::new(move || {
        let timing = match &http_metrics {
            Some(metrics) => TimingMiddleware::new(metrics.clone()),
            None => TimingMiddleware::disabled(),
        };
        let metrics_path = metrics_path.clone();

        App::new()
            .wrap(timing) // 最外层，记录请求延迟
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .app_data(web::Data::new(metrics_state.clone()))
            .app_data(web::Data::new(demo.clone()))
            .configure(move |cfg| configure_routes(cfg, &metrics_path))
    })
    .keep_alive(Duration::from_secs(30))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", server_config.host, server_config.port);
    warn!(
        "Starting server at http://{}{}",
        bind_address, server_config.metrics_path
    );

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    info!("Server stopped");
    Ok(())
}
