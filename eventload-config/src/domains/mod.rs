//! Domain-specific configuration modules

pub mod auth;
pub mod endpoints;
pub mod http;
pub mod load_test;
pub mod logging;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main eventload configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EventLoadConfig {
    /// HTTP client configuration
    pub http: http::HttpConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,

    /// Bearer token for the target APIs
    pub auth: auth::AuthConfig,

    /// Endpoint catalogue
    pub endpoints: endpoints::EndpointsConfig,

    /// Load test parameters
    pub load_test: load_test::LoadTestConfig,
}

impl EventLoadConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.http.validate()?;
        self.logging.validate()?;
        self.auth.validate()?;
        self.endpoints.validate()?;
        self.load_test.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = EventLoadConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
