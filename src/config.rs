//! Configuration management
//!
//! All tunables live in one TOML file with per-section defaults, so a
//! partial file only overrides what it names. The constants map directly to
//! the analysis parameters: window capacity N, aggregation period T, alert
//! lookback S, and the alert threshold.

use crate::error::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub schedule: ScheduleConfig,
    pub alert: AlertConfig,
    pub producer: ProducerConfig,
    pub monitor: MonitorConfig,
}

/// Per-device window settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Maximum buffered events per device (N)
    pub capacity: usize,
}

/// Periodic aggregation settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between aggregation passes (T)
    pub aggregate_interval_secs: u64,
}

/// Alert evaluation settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    /// Trailing span considered recent, in seconds (S)
    pub lookback_secs: u64,
    /// Error ratio above which an alert fires, 0-100
    pub threshold_percent: f64,
}

/// Synthetic log generator settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProducerConfig {
    /// Number of simulated devices, ids 1..=device_count
    pub device_count: u32,
    /// Milliseconds between events per device
    pub emit_interval_ms: u64,
}

/// Monitor HTTP surface settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Address the /api/monitor endpoint binds to
    pub listen_addr: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            aggregate_interval_secs: 5,
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            lookback_secs: 10,
            threshold_percent: 50.0,
        }
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            device_count: 8,
            emit_interval_ms: 100,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Check every value for sanity before wiring the pipeline
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "window.capacity must be greater than zero".to_string(),
            ));
        }
        if self.schedule.aggregate_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "schedule.aggregate_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.alert.lookback_secs == 0 {
            return Err(ConfigError::ValidationError(
                "alert.lookback_secs must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.alert.threshold_percent) {
            return Err(ConfigError::ValidationError(format!(
                "alert.threshold_percent must be within 0-100, got {}",
                self.alert.threshold_percent
            )));
        }
        if self.producer.device_count == 0 {
            return Err(ConfigError::ValidationError(
                "producer.device_count must be greater than zero".to_string(),
            ));
        }
        if self.producer.emit_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "producer.emit_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.monitor.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::ValidationError(format!(
                "monitor.listen_addr is not a valid socket address: {}",
                self.monitor.listen_addr
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_analysis_constants() {
        let config = Config::default();
        assert_eq!(config.window.capacity, 100);
        assert_eq!(config.schedule.aggregate_interval_secs, 5);
        assert_eq!(config.alert.lookback_secs, 10);
        assert_eq!(config.alert.threshold_percent, 50.0);
        assert_eq!(config.producer.device_count, 8);
        assert_eq!(config.producer.emit_interval_ms, 100);
        assert_eq!(config.monitor.listen_addr, "127.0.0.1:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_overrides_only_named_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ncapacity = 25\n\n[alert]\nlookback_secs = 30").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.window.capacity, 25);
        assert_eq!(config.alert.lookback_secs, 30);
        // Everything else keeps its default.
        assert_eq!(config.alert.threshold_percent, 50.0);
        assert_eq!(config.schedule.aggregate_interval_secs, 5);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = Config::from_file(Path::new("/nonexistent/logwarden.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window\ncapacity = ").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = Config::default();
        config.window.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.schedule.aggregate_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = Config::default();
        config.alert.threshold_percent = 150.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_listen_addr() {
        let mut config = Config::default();
        config.monitor.listen_addr = "not-an-addr".to_string();
        assert!(config.validate().is_err());
    }
}
