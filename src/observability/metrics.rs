//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Count rewrite outcomes per response
//! - Time the capture path
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `rewrite_responses_total` (counter): responses by `outcome`
//! - `rewrite_duration_seconds` (histogram): upstream call to terminal write
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Outcomes are a closed set of static labels

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Request never entered capture (method, upgrade).
pub const BYPASSED: &str = "bypassed";
/// Content type or encoding not monitored.
pub const INELIGIBLE: &str = "ineligible";
/// Declared encoding did not decode; raw bytes forwarded.
pub const DECODE_FAILED: &str = "decode_failed";
/// Eligible, but nothing to rewrite (empty body or no nonce).
pub const SKIPPED: &str = "skipped";
pub const REWRITTEN: &str = "rewritten";
/// Body exceeded the buffering limit and was streamed through.
pub const OVERSIZED: &str = "oversized";
pub const UPSTREAM_FAILED: &str = "upstream_failed";
pub const PANICKED: &str = "panicked";

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(err) => tracing::error!(address = %addr, error = %err, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(outcome: &'static str) {
    metrics::counter!("rewrite_responses_total", "outcome" => outcome).increment(1);
}

pub fn record_duration(start: Instant) {
    metrics::histogram!("rewrite_duration_seconds").record(start.elapsed().as_secs_f64());
}
