//! Error-spike alert evaluation
//!
//! Evaluated once per ingested event, for that event's device only. The
//! check looks at the trailing lookback span relative to wall-clock "now",
//! not at the full window: an event counts as recent when `now - timestamp`
//! is within the lookback, regardless of where it sits in the buffer.
//!
//! There is no hysteresis and no cool-down. If the condition still holds on
//! the next event for the same device, another alert is emitted; a sustained
//! error burst therefore floods the alert channel by design, and downstream
//! consumers must be prepared for that.

use crate::aggregator::DeviceWindow;
use crate::events::{AlertMessage, LogLevel, Timestamp};
use chrono::Duration;

/// Threshold check over a device's recent error ratio
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    /// Trailing span considered "recent", in seconds
    lookback_secs: i64,
    /// Ratio above which an alert fires, 0-100
    threshold_percent: f64,
}

impl AlertEvaluator {
    /// Create an evaluator with the given lookback and threshold
    pub fn new(lookback_secs: u64, threshold_percent: f64) -> Self {
        Self {
            lookback_secs: lookback_secs as i64,
            threshold_percent,
        }
    }

    /// Check one device's window against the threshold
    ///
    /// Re-scans the buffer on every call, O(window size); acceptable because
    /// both the capacity and the event rate are small and bounded. Returns
    /// `Some` when the recent error ratio strictly exceeds the threshold,
    /// `None` otherwise (including for an empty recent subset).
    pub fn evaluate(
        &self,
        device_id: u32,
        window: &DeviceWindow,
        now: Timestamp,
    ) -> Option<AlertMessage> {
        let snapshot = window.snapshot();
        let cutoff = now - Duration::seconds(self.lookback_secs);

        let mut recent_total = 0usize;
        let mut recent_errors = 0usize;
        for event in snapshot.events.iter() {
            if event.timestamp >= cutoff {
                recent_total += 1;
                if event.level == LogLevel::Error {
                    recent_errors += 1;
                }
            }
        }

        if recent_total == 0 {
            return None;
        }

        let ratio = recent_errors as f64 / recent_total as f64 * 100.0;
        if ratio > self.threshold_percent {
            Some(AlertMessage {
                device_id,
                alert_message: format!(
                    "ERROR ratio {:.2}% over the last {}s exceeds {:.0}%",
                    ratio, self.lookback_secs, self.threshold_percent
                ),
                timestamp: now,
            })
        } else {
            None
        }
    }
}
