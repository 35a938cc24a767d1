//! Core event and result types for the log analysis pipeline
//!
//! This module defines the wire-compatible data structures exchanged over the
//! inbound log channel and the outbound analysis/alert channels. All
//! timestamps on the wire use the `YYYY-MM-DD HH:MM:SS` format at second
//! resolution, naive local time with no offset; downstream consumers parse
//! exactly that format, so it must be preserved.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Timestamp type for consistent time handling across the application
pub type Timestamp = NaiveDateTime;

/// Wire format for all timestamps: second resolution, naive local time
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sentinel emitted for `last_error_timestamp` when a device has never
/// produced an ERROR event
pub const NO_ERROR_TIMESTAMP: &str = "0000-00-00 00:00:00";

/// Sentinel emitted for `last_error_message` when a device has never
/// produced an ERROR event
pub const NO_ERROR_MESSAGE: &str = "无";

/// Current wall-clock time, truncated to second resolution to match the
/// wire format
pub fn local_now() -> Timestamp {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Severity level of a log event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Informational message
    Info,
    /// Warning that may require attention
    Warn,
    /// Error indicating a problem on the device
    Error,
}

/// A single log event reported by a device
///
/// Produced by the inbound log channel and never mutated once constructed.
/// Arrival order on the channel is trusted as processing order; the embedded
/// timestamp is not required to be monotonic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEvent {
    /// Numeric identifier of the reporting device
    pub device_id: u32,
    /// When the device produced the event
    #[serde(with = "wire_timestamp")]
    pub timestamp: Timestamp,
    /// Severity of the event
    #[serde(rename = "log_level")]
    pub level: LogLevel,
    /// Log message content
    pub message: String,
}

/// Periodic aggregation snapshot for one device
///
/// Computed fresh on every tick from the device's current window; not
/// persisted by the analysis core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    /// Device the snapshot describes
    pub device_id: u32,
    /// Share of ERROR events in the current window, 0-100, 2 decimals
    pub error_percentage: f64,
    /// Share of WARN events in the current window, 0-100, 2 decimals
    pub warn_percentage: f64,
    /// Timestamp of the most recent ERROR event ever seen for this device
    #[serde(with = "wire_opt_timestamp")]
    pub last_error_timestamp: Option<Timestamp>,
    /// Message of the most recent ERROR event ever seen for this device
    #[serde(with = "wire_opt_message")]
    pub last_error_message: Option<String>,
    /// When this snapshot was generated; shared by all devices in one tick
    #[serde(with = "wire_timestamp")]
    pub analysis_timestamp: Timestamp,
}

/// Alert emitted when a device's recent error ratio breaches the threshold
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertMessage {
    /// Device that breached the threshold
    pub device_id: u32,
    /// Human-readable description of the breach
    pub alert_message: String,
    /// When the breach was detected
    #[serde(with = "wire_timestamp")]
    pub timestamp: Timestamp,
}

/// Serde adapter for the `YYYY-MM-DD HH:MM:SS` wire timestamp format
pub mod wire_timestamp {
    use super::{Timestamp, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter mapping `None` to the `0000-00-00 00:00:00` sentinel
pub mod wire_opt_timestamp {
    use super::{Timestamp, NO_ERROR_TIMESTAMP, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &Option<Timestamp>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match timestamp {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_str(NO_ERROR_TIMESTAMP),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == NO_ERROR_TIMESTAMP {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter mapping `None` to the `无` sentinel
pub mod wire_opt_message {
    use super::NO_ERROR_MESSAGE;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(message: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match message {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_str(NO_ERROR_MESSAGE),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if raw == NO_ERROR_MESSAGE {
            Ok(None)
        } else {
            Ok(Some(raw))
        }
    }
}
