//! Metrics registry plumbing and the scrape endpoint.
//!
//! The registry is an explicit object created by the caller and threaded
//! through engine construction; nothing registers with global state. The
//! daemon exposes it over HTTP in prometheus text format.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, IntCounter, IntGauge, Opts, TextEncoder};
pub use prometheus::Registry;
use tokio::net::TcpListener;
use tracing::info;

/// Instruments for the dispatch queue.
#[derive(Debug, Clone)]
pub struct QueueMetrics {
    /// Probes currently pending, mirrors queue length.
    pub depth: IntGauge,
    /// Pushes dropped because the probe was already pending.
    pub rejected: IntCounter,
}

impl QueueMetrics {
    /// Create the queue instruments and register them.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let metrics = Self::unregistered()?;
        registry.register(Box::new(metrics.depth.clone()))?;
        registry.register(Box::new(metrics.rejected.clone()))?;
        Ok(metrics)
    }

    /// Create the instruments without registering them anywhere.
    pub fn unregistered() -> Result<Self, prometheus::Error> {
        let depth = IntGauge::with_opts(
            Opts::new("depth", "Probes currently pending in the dispatch queue")
                .namespace("gwmon")
                .subsystem("queue"),
        )?;
        let rejected = IntCounter::with_opts(
            Opts::new(
                "rejected_total",
                "Pushes dropped because the probe was already pending",
            )
            .namespace("gwmon")
            .subsystem("queue"),
        )?;
        Ok(Self { depth, rejected })
    }
}

/// Render a registry's contents in prometheus text format.
pub fn render(registry: &Registry) -> Result<String, prometheus::Error> {
    let families = registry.gather();
    let mut buf = Vec::new();
    TextEncoder::new().encode(&families, &mut buf)?;
    String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

async fn scrape(State(registry): State<Registry>) -> Result<String, StatusCode> {
    render(&registry).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Build the router exposing `/metrics`.
pub fn build_router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(scrape))
        .with_state(registry)
}

/// Serve the scrape endpoint until the process exits.
pub async fn serve(addr: SocketAddr, registry: Registry) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "metrics listener started");
    axum::serve(listener, build_router(registry)).await
}
