//! Export Sink: Corrected Readings → Prometheus
//!
//! The sink is an explicitly owned object handed to the polling loop, not
//! a process-global registry, so tests and any future second pipeline can
//! run without cross-contamination.
//!
//! [`PrometheusSink`] owns a `prometheus::Registry` with one gauge per
//! metric the enabled sensors can produce, each carrying constant
//! `instance` and `sensor` labels. `serve` exposes the registry over HTTP
//! (`GET /metrics`) from a dedicated background thread running a
//! current-thread tokio runtime; the polling loop itself stays
//! single-threaded and synchronous. The backend scrapes on its own
//! schedule, independent of the poll cadence.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::thread;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{error, info, warn};
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use thiserror::Error;

use envirometer_core::SensorKind;

/// Failures constructing or exposing the export registry. Fatal at
/// startup; nothing here can fail mid-run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("metric registration failed: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("cannot bind metrics endpoint on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start metrics thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// Where the polling loop writes each derived value.
///
/// `set` is infallible by design: a publish failure is not something the
/// loop could act on, and the Prometheus model is "last value wins" pull
/// anyway.
pub trait ExportSink: Send + Sync {
    /// Publish the latest value for a metric.
    fn set(&self, metric: &str, value: f64);
}

/// Prometheus-backed sink with an HTTP exposition endpoint.
pub struct PrometheusSink {
    registry: Registry,
    gauges: HashMap<&'static str, Gauge>,
}

impl PrometheusSink {
    /// Register one gauge per metric the enabled sensors can produce.
    pub fn new(instance: &str, sensors: &[SensorKind]) -> Result<Self, ExportError> {
        let registry = Registry::new();
        let mut gauges = HashMap::new();
        for kind in sensors {
            for metric in kind.metrics() {
                let opts = Opts::new(*metric, SensorKind::metric_help(metric))
                    .const_label("instance", instance)
                    .const_label("sensor", kind.label());
                let gauge = Gauge::with_opts(opts)?;
                registry.register(Box::new(gauge.clone()))?;
                gauges.insert(*metric, gauge);
            }
        }
        Ok(Self { registry, gauges })
    }

    /// Start serving `GET /metrics` on `addr`.
    ///
    /// Binds synchronously so a bad port is a startup error, then hands
    /// the listener to a named background thread that owns the HTTP
    /// runtime for the life of the process.
    pub fn serve(&self, addr: SocketAddr) -> Result<(), ExportError> {
        let listener = std::net::TcpListener::bind(addr)
            .and_then(|l| l.set_nonblocking(true).map(|_| l))
            .map_err(|source| ExportError::Bind { addr, source })?;
        let registry = self.registry.clone();

        thread::Builder::new()
            .name("metrics-exporter".into())
            .spawn(move || run_endpoint(listener, registry))
            .map_err(ExportError::Thread)?;

        info!("metrics endpoint listening on http://{addr}/metrics");
        Ok(())
    }
}

impl ExportSink for PrometheusSink {
    fn set(&self, metric: &str, value: f64) {
        match self.gauges.get(metric) {
            Some(gauge) => gauge.set(value),
            // Only reachable if a driver produces a metric its sensor
            // never declared; worth a log line, not a crash.
            None => warn!("dropping value for unregistered metric {metric}"),
        }
    }
}

fn run_endpoint(listener: std::net::TcpListener, registry: Registry) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("metrics endpoint runtime failed to start: {e}");
            return;
        }
    };

    runtime.block_on(async move {
        let app = Router::new()
            .route("/metrics", get(render_metrics))
            .with_state(registry);
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(l) => l,
            Err(e) => {
                error!("metrics endpoint listener conversion failed: {e}");
                return;
            }
        };
        if let Err(e) = axum::serve(listener, app).await {
            error!("metrics endpoint failed: {e}");
        }
    });
}

async fn render_metrics(State(registry): State<Registry>) -> Response {
    let families = registry.gather();
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&families, &mut buf) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("encoding failed: {e}\n"),
        )
            .into_response();
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        buf,
    )
        .into_response()
}

/// In-memory sink for tests: remembers the latest value per metric.
#[derive(Default)]
pub struct MemorySink {
    values: Mutex<HashMap<String, f64>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published value for a metric, if any.
    pub fn get(&self, metric: &str) -> Option<f64> {
        self.lock().get(metric).copied()
    }

    /// Number of distinct metrics published so far.
    pub fn metrics(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, f64>> {
        // A poisoned map of floats is still a usable map of floats.
        self.values.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl ExportSink for MemorySink {
    fn set(&self, metric: &str, value: f64) {
        self.lock().insert(metric.to_string(), value);
    }
}
