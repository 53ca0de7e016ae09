//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mediator_relays_total` (counter): relays by envelope status
//! - `mediator_relay_duration_seconds` (histogram): relay latency by envelope status
//! - `mediator_upstream_responses_total` (counter): completed upstream exchanges by status code
//! - `mediator_config_updates_total` (counter): accepted config replacements by source

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished relay.
pub fn record_relay(outcome: &'static str, upstream_status: Option<u16>, start: Instant) {
    counter!("mediator_relays_total", "outcome" => outcome).increment(1);
    histogram!("mediator_relay_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());

    if let Some(status) = upstream_status {
        counter!("mediator_upstream_responses_total", "status" => status.to_string()).increment(1);
    }
}

/// Record an accepted configuration replacement.
pub fn record_config_update(source: &'static str) {
    counter!("mediator_config_updates_total", "source" => source).increment(1);
}
