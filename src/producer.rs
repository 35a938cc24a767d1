//! Synthetic per-device log generator
//!
//! One thread per simulated device, each emitting a weighted-random log
//! event at a fixed cadence onto the inbound channel as a serialized JSON
//! payload. INFO dominates, WARN is occasional, ERROR is rare, so alerts
//! only fire on genuine random bursts. Threads stop when the channel
//! closes.

use crate::config::ProducerConfig;
use crate::events::{local_now, LogEvent, LogLevel};
use log::{debug, info, warn};
use rand::Rng;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Level weighting: 9 INFO, 2 WARN, 1 ERROR
const LEVEL_WEIGHTS: [LogLevel; 12] = [
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Warn,
    LogLevel::Error,
];

/// Sample message pool
const MESSAGES: [&str; 3] = [
    "system status nominal",
    "disk space low",
    "database connection failed",
];

/// Build one random event for a device
fn sample_event<R: Rng>(device_id: u32, rng: &mut R) -> LogEvent {
    LogEvent {
        device_id,
        timestamp: local_now(),
        level: LEVEL_WEIGHTS[rng.gen_range(0..LEVEL_WEIGHTS.len())],
        message: MESSAGES[rng.gen_range(0..MESSAGES.len())].to_string(),
    }
}

/// Spawn one generator thread per device
///
/// Device ids run 1..=device_count. Each thread serializes its events to
/// JSON and sends them on `sink` until the receiving side goes away, then
/// exits.
pub fn spawn_fleet(config: &ProducerConfig, sink: Sender<String>) -> Vec<JoinHandle<()>> {
    let interval = Duration::from_millis(config.emit_interval_ms);
    info!(
        "starting {} device generators, one event per {:?} each",
        config.device_count, interval
    );

    (1..=config.device_count)
        .map(|device_id| {
            let sink = sink.clone();
            thread::spawn(move || {
                debug!("device {device_id} generator started");
                let mut rng = rand::thread_rng();
                loop {
                    let event = sample_event(device_id, &mut rng);
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("device {device_id} failed to serialize event: {e}");
                            continue;
                        }
                    };
                    if sink.send(payload).is_err() {
                        debug!("device {device_id} generator stopping: channel closed");
                        break;
                    }
                    thread::sleep(interval);
                }
            })
        })
        .collect()
}
