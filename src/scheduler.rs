//! The analysis control loop
//!
//! One thread owns all device windows and interleaves two concerns through a
//! single blocking wait: event arrival and the periodic aggregation tick.
//! The wait timeout is recomputed on every iteration as "time remaining
//! until the next tick deadline", clamped to zero, so no timer thread is
//! needed. When the wait times out, a tick runs; when an event arrives, it
//! is processed and the deadline is checked again, since the wall clock may
//! have crossed it while waiting or processing.
//!
//! The tick guarantee under load is at-least-once per interval, not
//! exactly-once: the event-path deadline check can produce an extra pass
//! within an interval when processing straddles the boundary.

use crate::aggregator::{rollup, DeviceWindow};
use crate::alerts::AlertEvaluator;
use crate::error::TransportError;
use crate::events::{local_now, AlertMessage, AnalysisResult, LogEvent, Timestamp};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

/// Single-owner scheduler over all per-device windows
///
/// All window state is owned and mutated by this struct alone; alert
/// evaluation and aggregation read it synchronously within the same loop
/// iteration, so no locking is involved.
pub struct AnalysisScheduler {
    /// One window per device, created lazily on first event
    windows: HashMap<u32, DeviceWindow>,
    /// Capacity for newly created windows
    window_capacity: usize,
    /// Time between aggregation passes
    tick_interval: Duration,
    /// Error-spike threshold check
    evaluator: AlertEvaluator,
    /// Diagnostic counter, reset on every tick
    events_since_last_tick: u64,
}

impl AnalysisScheduler {
    /// Create a scheduler with the given window capacity and tick interval
    pub fn new(window_capacity: usize, tick_interval: Duration, evaluator: AlertEvaluator) -> Self {
        Self {
            windows: HashMap::new(),
            window_capacity,
            tick_interval,
            evaluator,
            events_since_last_tick: 0,
        }
    }

    /// Process one event: update its device's window, then check for a spike
    ///
    /// The window is created lazily on the device's first event. The alert
    /// check always sees a window that already contains the triggering
    /// event.
    pub fn ingest(&mut self, event: LogEvent, now: Timestamp) -> Option<AlertMessage> {
        self.events_since_last_tick += 1;
        let device_id = event.device_id;
        let window = self
            .windows
            .entry(device_id)
            .or_insert_with(|| DeviceWindow::new(self.window_capacity));
        window.insert(event);
        self.evaluator.evaluate(device_id, window, now)
    }

    /// Run one aggregation pass over all devices
    ///
    /// Devices with empty windows are skipped. Resets the per-tick event
    /// counter.
    pub fn tick(&mut self, now: Timestamp) -> Vec<AnalysisResult> {
        let batch = rollup::aggregate_all(&self.windows, now);
        debug!(
            "aggregation pass: {} snapshots, {} events since last tick",
            batch.len(),
            self.events_since_last_tick
        );
        self.events_since_last_tick = 0;
        batch
    }

    /// Drive the loop until the transport fails
    ///
    /// Blocks on `inbound` with a deadline-derived timeout. Malformed
    /// payloads are logged and dropped; one bad event never aborts the loop
    /// or touches another device's window. A disconnected channel is fatal
    /// and returned as an error. There is no graceful drain: whatever is
    /// buffered but unaggregated at shutdown is lost.
    pub fn run(
        mut self,
        inbound: Receiver<String>,
        analysis_sink: Sender<AnalysisResult>,
        alert_sink: Sender<AlertMessage>,
    ) -> Result<(), TransportError> {
        info!(
            "analysis scheduler started: window capacity {}, tick every {:?}",
            self.window_capacity, self.tick_interval
        );
        let mut deadline = Instant::now() + self.tick_interval;

        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            match inbound.recv_timeout(timeout) {
                Ok(payload) => {
                    match serde_json::from_str::<LogEvent>(&payload) {
                        Ok(event) => {
                            let now = local_now();
                            if let Some(alert) = self.ingest(event, now) {
                                info!(
                                    "device {} alert: {}",
                                    alert.device_id, alert.alert_message
                                );
                                alert_sink
                                    .send(alert)
                                    .map_err(|_| TransportError::PublishFailed("alert channel"))?;
                            }
                        }
                        Err(e) => warn!("dropping malformed event payload: {e}"),
                    }

                    // The wall clock may have passed the deadline while we
                    // were waiting or processing.
                    if Instant::now() >= deadline {
                        self.publish_tick(&analysis_sink)?;
                        deadline = Instant::now() + self.tick_interval;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.publish_tick(&analysis_sink)?;
                    deadline = Instant::now() + self.tick_interval;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(TransportError::Disconnected("event source"));
                }
            }
        }
    }

    fn publish_tick(&mut self, analysis_sink: &Sender<AnalysisResult>) -> Result<(), TransportError> {
        for result in self.tick(local_now()) {
            analysis_sink
                .send(result)
                .map_err(|_| TransportError::PublishFailed("analysis channel"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{LogLevel, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use std::sync::mpsc;

    fn ts(s: &str) -> Timestamp {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
    }

    fn event(device_id: u32, level: LogLevel, stamp: &str) -> LogEvent {
        LogEvent {
            device_id,
            timestamp: ts(stamp),
            level,
            message: "m".to_string(),
        }
    }

    fn scheduler() -> AnalysisScheduler {
        AnalysisScheduler::new(100, Duration::from_secs(5), AlertEvaluator::new(10, 50.0))
    }

    #[test]
    fn test_ingest_creates_window_lazily() {
        let mut s = scheduler();
        assert!(s.windows.is_empty());

        s.ingest(event(1, LogLevel::Info, "2026-08-26 10:00:00"), ts("2026-08-26 10:00:00"));
        assert_eq!(s.windows.len(), 1);
        assert_eq!(s.windows.get(&1).unwrap().len(), 1);
    }

    #[test]
    fn test_ingest_returns_alert_for_spike() {
        let mut s = scheduler();
        let now = ts("2026-08-26 10:00:02");
        assert!(s
            .ingest(event(1, LogLevel::Error, "2026-08-26 10:00:00"), now)
            .is_some());
    }

    #[test]
    fn test_ingest_only_checks_triggering_device() {
        let mut s = scheduler();
        let now = ts("2026-08-26 10:00:02");
        // Device 1 in breach; an INFO event for device 2 must not alert.
        s.ingest(event(1, LogLevel::Error, "2026-08-26 10:00:00"), now);
        assert!(s
            .ingest(event(2, LogLevel::Info, "2026-08-26 10:00:01"), now)
            .is_none());
    }

    #[test]
    fn test_tick_aggregates_all_devices_and_resets_counter() {
        let mut s = scheduler();
        let now = ts("2026-08-26 10:00:02");
        s.ingest(event(1, LogLevel::Info, "2026-08-26 10:00:00"), now);
        s.ingest(event(2, LogLevel::Error, "2026-08-26 10:00:01"), now);
        assert_eq!(s.events_since_last_tick, 2);

        let batch = s.tick(ts("2026-08-26 10:00:05"));
        assert_eq!(batch.len(), 2);
        assert_eq!(s.events_since_last_tick, 0);
        assert!(batch
            .iter()
            .all(|r| r.analysis_timestamp == ts("2026-08-26 10:00:05")));
    }

    #[test]
    fn test_tick_with_no_devices_is_empty() {
        let mut s = scheduler();
        assert!(s.tick(ts("2026-08-26 10:00:05")).is_empty());
    }

    #[test]
    fn test_run_processes_events_and_ticks() {
        let (event_tx, event_rx) = mpsc::channel::<String>();
        let (analysis_tx, analysis_rx) = mpsc::channel();
        let (alert_tx, alert_rx) = mpsc::channel();

        let s = AnalysisScheduler::new(
            100,
            Duration::from_millis(100),
            AlertEvaluator::new(10, 50.0),
        );
        let handle = std::thread::spawn(move || s.run(event_rx, analysis_tx, alert_tx));

        // Two errors out of two recent events: every qualifying event alerts.
        let now = local_now();
        for _ in 0..2 {
            let payload = serde_json::to_string(&LogEvent {
                device_id: 7,
                timestamp: now,
                level: LogLevel::Error,
                message: "boom".to_string(),
            })
            .unwrap();
            event_tx.send(payload).unwrap();
        }
        // Malformed payload is dropped without killing the loop.
        event_tx.send("not json".to_string()).unwrap();

        let alert = alert_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("alert emitted");
        assert_eq!(alert.device_id, 7);

        let snapshot = analysis_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("tick produced a snapshot");
        assert_eq!(snapshot.device_id, 7);
        assert_eq!(snapshot.error_percentage, 100.0);

        // Closing the inbound channel is a fatal transport failure.
        drop(event_tx);
        let result = handle.join().unwrap();
        assert!(matches!(result, Err(TransportError::Disconnected(_))));
    }

    #[test]
    fn test_run_ticks_without_any_events() {
        let (event_tx, event_rx) = mpsc::channel::<String>();
        let (analysis_tx, analysis_rx) = mpsc::channel();
        let (alert_tx, _alert_rx) = mpsc::channel();

        let mut s = AnalysisScheduler::new(
            100,
            Duration::from_millis(50),
            AlertEvaluator::new(10, 50.0),
        );
        // Pre-seed a window so the tick has something to report.
        s.ingest(
            event(3, LogLevel::Warn, "2026-08-26 10:00:00"),
            ts("2026-08-26 10:00:00"),
        );

        let handle = std::thread::spawn(move || s.run(event_rx, analysis_tx, alert_tx));

        // No events sent: ticks still fire on the timeout path.
        let first = analysis_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("first idle tick");
        let second = analysis_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("second idle tick");
        assert_eq!(first.device_id, 3);
        assert_eq!(second.device_id, 3);
        assert_eq!(first.warn_percentage, 100.0);

        drop(event_tx);
        assert!(handle.join().unwrap().is_err());
    }
}
