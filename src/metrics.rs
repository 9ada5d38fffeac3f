//! Prometheus metrics for poll cycles and upstream latency.
//!
//! This module provides metrics for:
//! - Poll cycles (total, failed, duration)
//! - Rows written to the sink
//! - Slugs that did not resolve
//! - HTTP request latency per endpoint

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// Poll cycles started.
pub const METRIC_POLLS: &str = "polls_total";
/// Poll cycles that produced no row or failed to write it.
pub const METRIC_POLL_FAILURES: &str = "poll_failures_total";
/// Rows handed to the sink successfully.
pub const METRIC_ROWS_WRITTEN: &str = "rows_written_total";
/// Identifiers that resolved to no market.
pub const METRIC_NOT_FOUND: &str = "market_not_found_total";
/// Poll cycle duration.
pub const METRIC_POLL_DURATION: &str = "poll_duration_ms";
/// HTTP request latency.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";

/// Initialize all metric descriptions.
/// Call this once at startup, after a recorder is installed.
pub fn init_metrics() {
    describe_histogram!(METRIC_POLL_DURATION, "Poll cycle duration in milliseconds");
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );

    describe_counter!(METRIC_POLLS, "Total number of poll cycles started");
    describe_counter!(METRIC_POLL_FAILURES, "Total number of failed poll cycles");
    describe_counter!(METRIC_ROWS_WRITTEN, "Total number of rows written");
    describe_counter!(
        METRIC_NOT_FOUND,
        "Total number of identifiers that resolved to no market"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder and return its render handle.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint).record(latency_ms);
}

/// Record poll cycle duration.
pub fn record_poll_duration(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_POLL_DURATION).record(latency_ms);
}

/// Increment polls counter.
pub fn inc_polls() {
    counter!(METRIC_POLLS).increment(1);
}

/// Increment failed polls counter.
pub fn inc_poll_failures() {
    counter!(METRIC_POLL_FAILURES).increment(1);
}

/// Increment rows written counter.
pub fn inc_rows_written() {
    counter!(METRIC_ROWS_WRITTEN).increment(1);
}

/// Increment not-found counter.
pub fn inc_not_found() {
    counter!(METRIC_NOT_FOUND).increment(1);
}
