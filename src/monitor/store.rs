//! Per-device history of analysis snapshots and alerts
//!
//! Append-only, in memory, for the lifetime of the process. The store is
//! shared between the channel consumer threads (writers) and the HTTP
//! handler (reader) behind a mutex; readers copy out under the lock rather
//! than holding it.

use crate::events::{AlertMessage, AnalysisResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

/// Store shared between consumer threads and the HTTP surface
pub type SharedStore = Arc<Mutex<MonitorStore>>;

/// Accumulated analysis and alert history, keyed by device
#[derive(Debug, Default)]
pub struct MonitorStore {
    analysis_history: HashMap<u32, Vec<AnalysisResult>>,
    alert_history: HashMap<u32, Vec<AlertMessage>>,
}

impl MonitorStore {
    /// Append one analysis snapshot to its device's history
    pub fn add_analysis(&mut self, result: AnalysisResult) {
        self.analysis_history
            .entry(result.device_id)
            .or_default()
            .push(result);
    }

    /// Append one alert to its device's history
    pub fn add_alert(&mut self, alert: AlertMessage) {
        self.alert_history
            .entry(alert.device_id)
            .or_default()
            .push(alert);
    }

    /// Most recent analysis snapshot for a device, if any
    pub fn latest_analysis(&self, device_id: u32) -> Option<&AnalysisResult> {
        self.analysis_history.get(&device_id)?.last()
    }

    /// Most recent alert for a device, if any
    pub fn latest_alert(&self, device_id: u32) -> Option<&AlertMessage> {
        self.alert_history.get(&device_id)?.last()
    }

    /// Cumulative number of alerts seen for a device
    pub fn alert_count(&self, device_id: u32) -> usize {
        self.alert_history
            .get(&device_id)
            .map_or(0, |alerts| alerts.len())
    }

    /// Sorted union of all device ids seen on either channel
    pub fn device_ids(&self) -> Vec<u32> {
        let ids: BTreeSet<u32> = self
            .analysis_history
            .keys()
            .chain(self.alert_history.keys())
            .copied()
            .collect();
        ids.into_iter().collect()
    }
}
