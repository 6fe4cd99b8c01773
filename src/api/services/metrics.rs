//! Metrics endpoint
//!
//! Serves an exporter snapshot in the format negotiated from `Accept`.

use actix_web::http::header::ACCEPT;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error};

use crate::exporter::Exporter;

/// Serializes snapshot requests when enabled.
///
/// `Exporter::handle` does not lock around deferred evaluation, so two
/// concurrent scrapes would interleave deferred calls. The server holds
/// this guard for the whole snapshot instead.
#[derive(Default)]
pub struct SnapshotGuard {
    lock: Option<Mutex<()>>,
}

impl SnapshotGuard {
    pub fn new(serialize: bool) -> Self {
        Self {
            lock: serialize.then(|| Mutex::new(())),
        }
    }

    pub fn is_serialized(&self) -> bool {
        self.lock.is_some()
    }

    /// Run `f`, holding the lock if there is one.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.lock {
            Some(lock) => {
                let _held = lock.lock();
                f()
            }
            None => f(),
        }
    }
}

/// Shared state of the metrics endpoint
#[derive(Clone)]
pub struct MetricsState {
    pub exporter: Arc<Exporter>,
    pub guard: Arc<SnapshotGuard>,
}

impl MetricsState {
    pub fn new(exporter: Arc<Exporter>, serialize_snapshots: bool) -> Self {
        Self {
            exporter,
            guard: Arc::new(SnapshotGuard::new(serialize_snapshots)),
        }
    }
}

/// Metrics service handler
pub struct MetricsService;

impl MetricsService {
    /// Handle metrics export request
    pub async fn metrics(req: HttpRequest, state: web::Data<MetricsState>) -> impl Responder {
        let accept = req
            .headers()
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // Deferred functions are arbitrary blocking code.
        let state = state.into_inner();
        let result = web::block(move || {
            state
                .guard
                .run(|| state.exporter.handle(accept.as_deref()))
        })
        .await;

        match result {
            Ok(Ok(snapshot)) => {
                debug!("Serving {} byte metrics snapshot", snapshot.as_bytes().len());
                HttpResponse::Ok()
                    .content_type(snapshot.content_type())
                    .body(snapshot.into_bytes())
            }
            Ok(Err(e)) => {
                error!("Failed to produce metrics snapshot: {}", e);
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body(e.format_simple())
            }
            Err(e) => {
                error!("Metrics snapshot task failed: {}", e);
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("metrics snapshot task failed")
            }
        }
    }
}
