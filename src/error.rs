use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Errors raised by the channel transport connecting the pipeline stages
///
/// A disconnected channel means a stage has gone away for good; there is no
/// reconnect logic, the process fails fast and relies on external
/// supervision for restart.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Channel disconnected: {0}")]
    Disconnected(&'static str),

    #[error("Failed to publish to {0}: receiver dropped")]
    PublishFailed(&'static str),
}
