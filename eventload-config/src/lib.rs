//! Domain-driven configuration management for eventload
//!
//! Configuration is split by functional domain (HTTP client, logging, auth,
//! endpoints, load test parameters), each with its own defaults and
//! validation. Values come from a YAML file and can be overridden through
//! `EVENTLOAD_*` environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    auth::AuthConfig,
    endpoints::{EndpointConfig, EndpointsConfig},
    http::HttpConfig,
    load_test::{EpisodeFilterType, LoadTestConfig},
    logging::LoggingConfig,
    EventLoadConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
