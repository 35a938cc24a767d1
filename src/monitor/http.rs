//! HTTP query surface for the monitor store
//!
//! A single endpoint, `GET /api/monitor`, returning one status row per known
//! device as a JSON array. The response shape and its sentinel strings are
//! part of the wire contract with existing dashboard consumers.

use crate::events::{NO_ERROR_MESSAGE, NO_ERROR_TIMESTAMP, TIMESTAMP_FORMAT};
use crate::monitor::store::{MonitorStore, SharedStore};
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use serde::Serialize;
use std::net::SocketAddr;

/// Sentinel for devices that have produced no analysis snapshot yet
const NO_DATA: &str = "无数据";

/// One row of the /api/monitor response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeviceStatus {
    pub device_id: u32,
    pub warn_percentage: f64,
    pub error_percentage: f64,
    pub last_error_timestamp: String,
    pub alert_status: String,
    pub alert_count: usize,
    pub analysis_timestamp: String,
    pub alert_timestamp: String,
}

/// Build the status rows for every known device
///
/// Called with the store lock held; pure read, no allocation beyond the
/// result itself.
pub fn status_rows(store: &MonitorStore) -> Vec<DeviceStatus> {
    store
        .device_ids()
        .into_iter()
        .map(|device_id| {
            let analysis = store.latest_analysis(device_id);
            let alert = store.latest_alert(device_id);

            DeviceStatus {
                device_id,
                warn_percentage: analysis.map_or(0.0, |a| a.warn_percentage),
                error_percentage: analysis.map_or(0.0, |a| a.error_percentage),
                last_error_timestamp: analysis.map_or_else(
                    || NO_DATA.to_string(),
                    |a| {
                        a.last_error_timestamp.map_or_else(
                            || NO_ERROR_TIMESTAMP.to_string(),
                            |ts| ts.format(TIMESTAMP_FORMAT).to_string(),
                        )
                    },
                ),
                alert_status: alert.map_or_else(
                    || NO_ERROR_MESSAGE.to_string(),
                    |a| a.alert_message.clone(),
                ),
                alert_count: store.alert_count(device_id),
                analysis_timestamp: analysis.map_or_else(
                    || NO_DATA.to_string(),
                    |a| a.analysis_timestamp.format(TIMESTAMP_FORMAT).to_string(),
                ),
                alert_timestamp: alert.map_or_else(
                    || NO_ERROR_TIMESTAMP.to_string(),
                    |a| a.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                ),
            }
        })
        .collect()
}

/// Build the monitor router
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/api/monitor", get(monitor_overview))
        .with_state(store)
}

async fn monitor_overview(State(store): State<SharedStore>) -> impl IntoResponse {
    // Synchronized copy-out: build the rows under the lock, serialize after.
    let rows = match store.lock() {
        Ok(store) => status_rows(&store),
        Err(poisoned) => status_rows(&poisoned.into_inner()),
    };
    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(rows),
    )
}

/// Bind and serve the monitor API until the process exits
pub async fn serve(addr: SocketAddr, store: SharedStore) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("monitor API listening on http://{addr}/api/monitor");
    axum::serve(listener, router(store)).await
}
