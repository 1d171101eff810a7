//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the shiptrack server:
//! - HTTP request metrics (latency, counts)
//! - Status update run state (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shiptrack_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shiptrack_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Status Update Metrics (collected dynamically)
// =============================================================================

/// Whether a batch run is in progress.
pub static UPDATES_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shiptrack_updates_in_progress",
        "1 while a status update run is in progress",
    )
    .unwrap()
});

/// Shipments completed in the current run.
pub static UPDATE_PROGRESS_COMPLETED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shiptrack_update_progress_completed",
        "Shipments completed in the current status update run",
    )
    .unwrap()
});

/// Shipments queued in the current run.
pub static UPDATE_PROGRESS_TOTAL: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "shiptrack_update_progress_total",
        "Shipments queued in the current status update run",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Status updates
    registry
        .register(Box::new(UPDATES_IN_PROGRESS.clone()))
        .unwrap();
    registry
        .register(Box::new(UPDATE_PROGRESS_COMPLETED.clone()))
        .unwrap();
    registry
        .register(Box::new(UPDATE_PROGRESS_TOTAL.clone()))
        .unwrap();

    // Core metrics (status checks, batches)
    for metric in shiptrack_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the orchestrator's current run.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let orchestrator = state.orchestrator();
    UPDATES_IN_PROGRESS.set(if orchestrator.is_updating() { 1 } else { 0 });

    let progress = orchestrator.progress().await;
    UPDATE_PROGRESS_COMPLETED.set(progress.completed as i64);
    UPDATE_PROGRESS_TOTAL.set(progress.total as i64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("shiptrack_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs vector metrics that have been accessed
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        UPDATES_IN_PROGRESS.set(0);
        shiptrack_core::metrics::STATUS_CHECKS
            .with_label_values(&["updated"])
            .inc();
        shiptrack_core::metrics::BATCHES
            .with_label_values(&["completed"])
            .inc();

        let output = encode_metrics();

        assert!(output.contains("shiptrack_http_request_duration_seconds"));
        assert!(output.contains("shiptrack_http_requests_in_flight"));
        assert!(output.contains("shiptrack_updates_in_progress"));
        assert!(output.contains("shiptrack_update_progress_total"));
        assert!(output.contains("shiptrack_status_checks_total"));
        assert!(output.contains("shiptrack_status_check_retries_total"));
        assert!(output.contains("shiptrack_batches_total"));
    }
}
