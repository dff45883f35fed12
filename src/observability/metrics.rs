//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gatekeeper_requests_admitted_total` (counter): requests that passed every gate
//! - `gatekeeper_rejections_total` (counter): rejections by gate and reason
//! - `gatekeeper_rate_limited_total` (counter): rate limiter denials
//! - `gatekeeper_logins_total` (counter): login attempts by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are static strings only; paths and users stay out of labels

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admitted() {
    counter!("gatekeeper_requests_admitted_total").increment(1);
}

pub fn record_rejection(gate: &'static str, reason: &'static str) {
    counter!("gatekeeper_rejections_total", "gate" => gate, "reason" => reason).increment(1);
}

pub fn record_rate_limited() {
    counter!("gatekeeper_rate_limited_total").increment(1);
}

pub fn record_login(outcome: &'static str) {
    counter!("gatekeeper_logins_total", "outcome" => outcome).increment(1);
}
