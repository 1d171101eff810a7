//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Status checks (results, retries, latency)
//! - Batch runs

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Status Check Metrics
// =============================================================================

/// Status checks total by result.
pub static STATUS_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_status_checks_total", "Total shipment status checks"),
        &["result"], // "updated", "skipped", "failed"
    )
    .unwrap()
});

/// Extra attempts made after a failed status check.
pub static STATUS_CHECK_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shiptrack_status_check_retries_total",
        "Total status check retry attempts",
    )
    .unwrap()
});

/// Status checks where the backend reported a status change.
pub static STATUS_CHANGES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shiptrack_status_changes_total",
        "Total shipment status changes reported by the backend",
    )
    .unwrap()
});

/// Remote call duration in seconds.
pub static STATUS_CHECK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shiptrack_status_check_duration_seconds",
            "Duration of remote status check calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["carrier"],
    )
    .unwrap()
});

/// Failed remote calls by error kind.
pub static STATUS_CHECK_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shiptrack_status_check_errors_total",
            "Failed remote status check calls",
        ),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batch runs total by result.
pub static BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_batches_total", "Total batch update runs"),
        &["result"], // "completed", "cancelled", "failed"
    )
    .unwrap()
});

/// Register all core metrics with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Status checks
        Box::new(STATUS_CHECKS.clone()),
        Box::new(STATUS_CHECK_RETRIES.clone()),
        Box::new(STATUS_CHANGES.clone()),
        Box::new(STATUS_CHECK_DURATION.clone()),
        Box::new(STATUS_CHECK_ERRORS.clone()),
        // Batches
        Box::new(BATCHES.clone()),
    ]
}
