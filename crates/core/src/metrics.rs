//! Metrics definitions for the ingestion engine.
//!
//! This module defines all metrics used throughout the reconciler.
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

use crate::models::StreamKind;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!("ingest_cycles_total", "Total number of ingestion cycles run");
    describe_counter!(
        "fetch_errors_total",
        "Total number of upstream fetch failures (each aborts one cycle)"
    );
    describe_counter!(
        "events_applied_total",
        "Total number of events applied to the domain store, per stream"
    );
    describe_counter!(
        "item_failures_total",
        "Total number of per-item processing failures, per stream"
    );
    describe_counter!(
        "checkpoint_persist_failures_total",
        "Total number of checkpoint persistence failures, per stream"
    );
    describe_histogram!(
        "cycle_duration_seconds",
        "Time taken by one ingestion cycle in seconds"
    );
}

/// Record a started ingestion cycle.
pub fn record_cycle() {
    counter!("ingest_cycles_total").increment(1);
}

/// Record an upstream fetch failure.
pub fn record_fetch_error() {
    counter!("fetch_errors_total").increment(1);
}

/// Record events applied to the domain store for one stream.
pub fn record_events_applied(stream: StreamKind, count: u64) {
    counter!("events_applied_total", "stream" => stream.as_str()).increment(count);
}

/// Record a per-item processing failure.
pub fn record_item_failure(stream: StreamKind) {
    counter!("item_failures_total", "stream" => stream.as_str()).increment(1);
}

/// Record a checkpoint persistence failure.
pub fn record_checkpoint_persist_failure(stream: StreamKind) {
    counter!("checkpoint_persist_failures_total", "stream" => stream.as_str()).increment(1);
}

/// A timer that records the cycle duration when dropped.
pub struct CycleTimer {
    start: Instant,
}

impl CycleTimer {
    /// Start a new cycle timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for CycleTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CycleTimer {
    fn drop(&mut self) {
        histogram!("cycle_duration_seconds").record(self.start.elapsed().as_secs_f64());
    }
}
