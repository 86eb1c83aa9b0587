//! Configuration error types

use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Anything that stops a configuration from loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// A set `EVENTLOAD_*` variable that does not parse
    #[error("Environment variable error: {0}")]
    EnvError(String),

    /// A field that parsed but is out of range for its domain
    #[error("Invalid {domain} configuration: {message}")]
    DomainError { domain: String, message: String },
}
