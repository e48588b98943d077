//! Metrics definitions for the Stage Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `stage_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus metrics recorder and return its handle.
///
/// Must be called before any metrics are recorded. Event handling is pure
/// in-memory work, so the buckets are sub-millisecond heavy.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("stage_event_duration".to_string()),
            &[
                0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.010, 0.050, 0.100,
            ],
        )
        .map_err(|e| format!("Failed to set event duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Event Metrics
// ============================================================================

/// Record one routed event and how long the coordinator spent on it.
///
/// Metrics: `stage_events_total`, `stage_event_duration_seconds`
/// Labels: `event`
///
/// Cardinality: bounded by `StageEvent` variants
pub fn record_event(event: &'static str, duration: Duration) {
    counter!("stage_events_total", "event" => event).increment(1);
    histogram!("stage_event_duration_seconds", "event" => event).record(duration.as_secs_f64());
}

// ============================================================================
// Selection Metrics
// ============================================================================

/// Record a large video retarget.
///
/// Metric: `stage_large_target_switches_total`
/// Labels: `reason`
///
/// Cardinality: bounded by `TargetReason` variants
pub fn record_large_target_switch(reason: &'static str) {
    counter!("stage_large_target_switches_total", "reason" => reason).increment(1);
}

/// Record how a display switch resolved.
///
/// Metric: `stage_display_switches_total`
/// Labels: `outcome` (completed, stale, cancelled)
///
/// A high stale rate means users click faster than the renderer switches.
pub fn record_display_switch(outcome: &'static str) {
    counter!("stage_display_switches_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// LastN Metrics
// ============================================================================

/// Record entering IDs dropped because they were not in the server or local set.
///
/// Metric: `stage_last_n_ignored_ids_total`
///
/// Non-zero values point at a signaling layer bug.
pub fn record_last_n_ignored(count: usize) {
    counter!("stage_last_n_ignored_ids_total").increment(count as u64);
}

/// Set the local LastN capacity.
///
/// Metric: `stage_local_last_n_capacity`
pub fn set_local_last_n_capacity(capacity: usize) {
    // usize to f64 conversion is safe for realistic capacities
    #[allow(clippy::cast_precision_loss)]
    gauge!("stage_local_last_n_capacity").set(capacity as f64);
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Set the number of registered participants, local included.
///
/// Metric: `stage_participants`
pub fn set_participants(count: usize) {
    // usize to f64 conversion is safe for realistic call sizes
    #[allow(clippy::cast_precision_loss)]
    gauge!("stage_participants").set(count as f64);
}

/// Set the session actor mailbox depth.
///
/// Metric: `stage_actor_mailbox_depth`
pub fn set_mailbox_depth(depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("stage_actor_mailbox_depth").set(depth as f64);
}
