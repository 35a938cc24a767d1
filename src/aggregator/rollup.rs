//! Periodic full-window rollup
//!
//! On every tick the scheduler runs one aggregation pass over all known
//! device windows. Percentages are computed over the current buffer contents
//! only; the last-error fields come from the eviction-independent cache. The
//! alert path is time-windowed, this one deliberately is not.

use crate::aggregator::DeviceWindow;
use crate::events::{AnalysisResult, LogLevel, Timestamp};
use std::collections::HashMap;

/// Round a percentage to two decimal places for the wire format
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate one device's window into a snapshot
///
/// Returns `None` for an empty window: devices without buffered events are
/// skipped entirely rather than reported as all-zero.
pub fn aggregate_device(
    device_id: u32,
    window: &DeviceWindow,
    analysis_timestamp: Timestamp,
) -> Option<AnalysisResult> {
    let snapshot = window.snapshot();
    let total = snapshot.events.len();
    if total == 0 {
        return None;
    }

    let error_count = snapshot
        .events
        .iter()
        .filter(|e| e.level == LogLevel::Error)
        .count();
    let warn_count = snapshot
        .events
        .iter()
        .filter(|e| e.level == LogLevel::Warn)
        .count();

    Some(AnalysisResult {
        device_id,
        error_percentage: round2(error_count as f64 / total as f64 * 100.0),
        warn_percentage: round2(warn_count as f64 / total as f64 * 100.0),
        last_error_timestamp: snapshot.last_error.map(|e| e.timestamp),
        last_error_message: snapshot.last_error.map(|e| e.message.clone()),
        analysis_timestamp,
    })
}

/// Run a full aggregation pass over all device windows
///
/// Every snapshot in the returned batch shares the same
/// `analysis_timestamp`. Batch order across devices is unspecified.
pub fn aggregate_all(
    windows: &HashMap<u32, DeviceWindow>,
    analysis_timestamp: Timestamp,
) -> Vec<AnalysisResult> {
    windows
        .iter()
        .filter_map(|(device_id, window)| aggregate_device(*device_id, window, analysis_timestamp))
        .collect()
}
