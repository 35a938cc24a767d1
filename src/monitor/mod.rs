//! Downstream monitor: history store, channel consumers, HTTP surface

/// Per-device analysis and alert history
pub mod store;

/// HTTP query surface over the store
pub mod http;

pub use store::{MonitorStore, SharedStore};

use crate::events::{AlertMessage, AnalysisResult};
use log::{debug, info};
use std::sync::mpsc::Receiver;
use std::thread::{self, JoinHandle};

/// Spawn the two consumer threads draining the outbound channels
///
/// One thread per channel, each appending into the shared store until its
/// channel disconnects. The lock is only held for the append, never across
/// a blocking wait.
pub fn spawn_consumers(
    store: SharedStore,
    analysis_source: Receiver<AnalysisResult>,
    alert_source: Receiver<AlertMessage>,
) -> Vec<JoinHandle<()>> {
    let analysis_store = store.clone();
    let analysis_handle = thread::spawn(move || {
        while let Ok(result) = analysis_source.recv() {
            debug!(
                "device {} snapshot: error {:.2}%, warn {:.2}%",
                result.device_id, result.error_percentage, result.warn_percentage
            );
            if let Ok(mut store) = analysis_store.lock() {
                store.add_analysis(result);
            }
        }
        info!("analysis consumer stopped: channel closed");
    });

    let alert_handle = thread::spawn(move || {
        while let Ok(alert) = alert_source.recv() {
            info!("device {} alert recorded: {}", alert.device_id, alert.alert_message);
            if let Ok(mut store) = store.lock() {
                store.add_alert(alert);
            }
        }
        info!("alert consumer stopped: channel closed");
    });

    vec![analysis_handle, alert_handle]
}
