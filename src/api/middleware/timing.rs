//! HTTP timing middleware
//!
//! Records request duration and active connections through the exporter.
//! Passes requests through untouched when built without metrics.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use prometheus::Gauge;
use std::rc::Rc;
use std::time::Instant;

use crate::errors::Result;
use crate::exporter::Exporter;
use crate::instrument::Decorator;

/// Metrics recorded for every HTTP request.
#[derive(Clone)]
pub struct HttpMetrics {
    duration: Decorator,
    active_connections: Gauge,
}

impl HttpMetrics {
    pub fn register(exporter: &Exporter) -> Result<Self> {
        let duration = exporter
            .histogram(
                "http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .build()?;
        let active_connections = exporter
            .info(
                "http_active_connections",
                "Number of HTTP requests currently being served",
            )
            .build()?;

        Ok(Self {
            duration,
            active_connections,
        })
    }
}

/// Drop guard that decrements active connections when dropped.
/// Ensures `dec()` runs even if the future panics.
struct ActiveConnectionGuard(Gauge);

impl ActiveConnectionGuard {
    fn enter(gauge: &Gauge) -> Self {
        gauge.inc();
        Self(gauge.clone())
    }
}

impl Drop for ActiveConnectionGuard {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// HTTP timing middleware factory
#[derive(Clone, Default)]
pub struct TimingMiddleware {
    metrics: Option<HttpMetrics>,
}

impl TimingMiddleware {
    pub fn new(metrics: HttpMetrics) -> Self {
        Self {
            metrics: Some(metrics),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

impl<S, B> Transform<S, ServiceRequest> for TimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TimingService<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TimingService {
            service: Rc::new(service),
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct TimingService<S> {
    service: Rc<S>,
    metrics: Option<HttpMetrics>,
}

impl<S, B> Service<ServiceRequest> for TimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::result::Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let Some(metrics) = self.metrics.clone() else {
            return Box::pin(async move { srv.call(req).await });
        };

        Box::pin(async move {
            let start = Instant::now();
            let _guard = ActiveConnectionGuard::enter(&metrics.active_connections);

            let result = srv.call(req).await;

            metrics
                .duration
                .record(start.elapsed().as_secs_f64().max(0.0));
            result
        })
    }
}
