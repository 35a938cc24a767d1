/// Error types for the log analysis pipeline
pub mod error;

/// Wire-compatible event, snapshot and alert types
pub mod events;

/// Configuration management
pub mod config;

/// Per-device bounded windows and the periodic rollup
pub mod aggregator;

/// Error-spike alert evaluation
pub mod alerts;

/// The analysis control loop
pub mod scheduler;

/// Synthetic per-device log generator
pub mod producer;

/// History store and HTTP query surface
pub mod monitor;

// Re-export commonly used types
pub use error::{ConfigError, TransportError};
pub use events::{AlertMessage, AnalysisResult, LogEvent, LogLevel, Timestamp};
