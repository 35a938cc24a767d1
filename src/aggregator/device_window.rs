//! Bounded per-device event window
//!
//! Each device gets one window holding its most recent events in arrival
//! order, plus a cache of the most recent ERROR event that survives
//! eviction. Windows are created lazily on a device's first event and live
//! for the rest of the process.

use crate::events::{LogEvent, LogLevel};
use std::collections::VecDeque;

/// Bounded FIFO of the most recent events for one device
///
/// The buffer never holds more than `capacity` events; inserting into a full
/// window evicts the oldest entry. The `last_error` cache is independent of
/// the buffer: it keeps the most recent ERROR event even after that event
/// has been evicted, and is never reset.
#[derive(Debug)]
pub struct DeviceWindow {
    /// Recent events, oldest first, arrival order
    buffer: VecDeque<LogEvent>,
    /// Maximum number of buffered events
    capacity: usize,
    /// Most recent ERROR event ever seen, eviction-independent
    last_error: Option<LogEvent>,
}

/// Read-only view of a window for aggregation and alerting
#[derive(Debug, Clone, Copy)]
pub struct WindowSnapshot<'a> {
    /// Buffered events, oldest first
    pub events: &'a VecDeque<LogEvent>,
    /// Most recent ERROR event ever seen for this device
    pub last_error: Option<&'a LogEvent>,
}

impl DeviceWindow {
    /// Create an empty window with the given capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            last_error: None,
        }
    }

    /// Append an event, evicting the oldest entry if the window is full
    ///
    /// ERROR events unconditionally overwrite the `last_error` cache, even
    /// when the previous value is still present in the buffer. Never fails.
    pub fn insert(&mut self, event: LogEvent) {
        if event.level == LogLevel::Error {
            self.last_error = Some(event.clone());
        }
        self.buffer.push_back(event);
        while self.buffer.len() > self.capacity {
            self.buffer.pop_front();
        }
    }

    /// Read-only view of the buffer and the last-error cache
    ///
    /// No side effects; calling it twice without an intervening `insert`
    /// yields identical results.
    pub fn snapshot(&self) -> WindowSnapshot<'_> {
        WindowSnapshot {
            events: &self.buffer,
            last_error: self.last_error.as_ref(),
        }
    }

    /// Number of buffered events
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the window holds no events
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}


// Property-based tests
#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::events::Timestamp;
    use chrono::NaiveDate;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn base_time() -> Timestamp {
        NaiveDate::from_ymd_opt(2026, 8, 26)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn numbered_event(sequence: usize, level: LogLevel) -> LogEvent {
        LogEvent {
            device_id: 1,
            timestamp: base_time() + chrono::Duration::seconds(sequence as i64),
            level,
            message: format!("event {sequence}"),
        }
    }

    /// Window capacity between 1 and 50
    #[derive(Debug, Clone)]
    struct Capacity(usize);

    impl Arbitrary for Capacity {
        fn arbitrary(g: &mut Gen) -> Self {
            Capacity((u8::arbitrary(g) % 50 + 1) as usize)
        }
    }

    /// Event level sequence of length 1-200
    #[derive(Debug, Clone)]
    struct LevelSequence(Vec<LogLevel>);

    impl Arbitrary for LevelSequence {
        fn arbitrary(g: &mut Gen) -> Self {
            let size = usize::arbitrary(g) % 200 + 1;
            let levels = (0..size)
                .map(|_| match u8::arbitrary(g) % 3 {
                    0 => LogLevel::Info,
                    1 => LogLevel::Warn,
                    _ => LogLevel::Error,
                })
                .collect();
            LevelSequence(levels)
        }
    }

    #[quickcheck]
    fn prop_buffer_never_exceeds_capacity(capacity: Capacity, levels: LevelSequence) -> bool {
        let mut window = DeviceWindow::new(capacity.0);
        for (i, level) in levels.0.iter().enumerate() {
            window.insert(numbered_event(i, *level));
            if window.len() > capacity.0 {
                return false;
            }
        }
        true
    }

    #[quickcheck]
    fn prop_buffer_keeps_most_recent_events(capacity: Capacity, levels: LevelSequence) -> bool {
        let mut window = DeviceWindow::new(capacity.0);
        for (i, level) in levels.0.iter().enumerate() {
            window.insert(numbered_event(i, *level));
        }

        let total = levels.0.len();
        let expected_len = total.min(capacity.0);
        let snapshot = window.snapshot();
        if snapshot.events.len() != expected_len {
            return false;
        }

        // Strict FIFO: the survivors are exactly the last `expected_len`
        // insertions, in arrival order.
        snapshot
            .events
            .iter()
            .zip(total - expected_len..total)
            .all(|(event, sequence)| event.message == format!("event {sequence}"))
    }

    #[quickcheck]
    fn prop_last_error_matches_most_recent_error(capacity: Capacity, levels: LevelSequence) -> bool {
        let mut window = DeviceWindow::new(capacity.0);
        for (i, level) in levels.0.iter().enumerate() {
            window.insert(numbered_event(i, *level));
        }

        let expected = levels
            .0
            .iter()
            .enumerate()
            .rev()
            .find(|(_, level)| **level == LogLevel::Error)
            .map(|(i, _)| format!("event {i}"));

        window.snapshot().last_error.map(|e| e.message.clone()) == expected
    }
}
