//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rehost_requests_total` (counter): requests by method, status, outcome
//! - `rehost_request_duration_seconds` (histogram): time to response head, by outcome
//! - `rehost_rewritten_attributes_total` (counter): URL attributes pointed at the proxy
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome labels.
pub const OUTCOME_ROBOTS: &str = "robots";
pub const OUTCOME_HTML: &str = "html";
pub const OUTCOME_OPAQUE: &str = "opaque";

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    ::metrics::counter!(
        "rehost_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    ::metrics::histogram!("rehost_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rewritten_attribute() {
    ::metrics::counter!("rehost_rewritten_attributes_total").increment(1);
}
