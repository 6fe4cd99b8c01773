//! Demo endpoints
//!
//! Small routes showing each way of declaring metrics: a deferred gauge,
//! stacked counter and gauge wrappers, an info gauge and an enum.

use actix_web::{HttpResponse, Responder, web};
use prometheus::Gauge;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exporter::Exporter;
use crate::labels;
use crate::metrics::EnumHandle;

const INDEX: &str = "<pre>
The following endpoints are defined:
/gauge: a deferred gauge metric that runs only when /metrics is called,
        otherwise just prints a random value
/multiple: an endpoint with multiple metrics attached: info, counter, and gauge
        The info metric is set to a random value
        The counter metric counts the number of calls
        The gauge metric stores the time taken by the latest call
/enum: an enum metric that shows the state of the call
        The state is running while the call sleeps, then stopped
        Go to /metrics in another tab while this endpoint is loading
/metrics: all metrics registered in the application
</pre>";

type DemoFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Metrics and wrapped functions behind the demo routes
#[derive(Clone)]
pub struct DemoState {
    deferred_gauge: DemoFn,
    multiple: DemoFn,
    info: Gauge,
    state: EnumHandle,
    enum_delay: Duration,
}

impl DemoState {
    pub fn register(exporter: &Exporter, enum_delay: Duration) -> Result<Self> {
        let info = exporter
            .info("some_informative_metric", "Test Information Metrics")
            .labels(labels! { "label" => "value" })
            .build()?;

        let state = exporter
            .enumeration("enum_metrics", "Test Enum Metrics")
            .states(["running", "stopped"])
            .build()?;

        // Its return value becomes the gauge value at snapshot time.
        let deferred_gauge = exporter
            .gauge(
                "test_defer_gauge",
                "A Gauge metric that runs when metrics endpoint is called",
            )
            .deferred(true)
            .build()?
            .defer(|| rand::random::<f64>().to_string())?;

        let counter = exporter
            .counter("test_counter", "Test Metric Counter")
            .build()?;
        let gauge = exporter
            .gauge(
                "test_gauge",
                "A Gauge metric that executes only when the function is called",
            )
            .build()?;
        let info_handle = info.clone();
        let multiple = counter.wrap(gauge.wrap(move || {
            info_handle.set(rand::random::<f64>());
            rand::random::<f64>().to_string()
        })?)?;

        debug!("Demo metrics registered");
        Ok(Self {
            deferred_gauge: Arc::new(deferred_gauge),
            multiple: Arc::new(multiple),
            info,
            state,
            enum_delay,
        })
    }

    pub fn info(&self) -> &Gauge {
        &self.info
    }

    pub fn state(&self) -> &EnumHandle {
        &self.state
    }
}

/// Demo service handlers
pub struct DemoService;

impl DemoService {
    pub async fn index() -> impl Responder {
        HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(INDEX)
    }

    pub async fn gauge(demo: web::Data<DemoState>) -> impl Responder {
        HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body((demo.deferred_gauge)())
    }

    pub async fn multiple(demo: web::Data<DemoState>) -> impl Responder {
        HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body((demo.multiple)())
    }

    pub async fn enumeration(demo: web::Data<DemoState>) -> impl Responder {
        if let Err(e) = demo.state.set_state("running") {
            return HttpResponse::InternalServerError().body(e.format_simple());
        }
        info!("Enum demo running for {:?}", demo.enum_delay);
        tokio::time::sleep(demo.enum_delay).await;
        if let Err(e) = demo.state.set_state("stopped") {
            return HttpResponse::InternalServerError().body(e.format_simple());
        }

        HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("Done!")
    }
}

/// Register the demo routes on the application root
pub fn demo_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(DemoService::index))
        .route("/gauge", web::get().to(DemoService::gauge))
        .route("/multiple", web::get().to(DemoService::multiple))
        .route("/enum", web::get().to(DemoService::enumeration));
}
