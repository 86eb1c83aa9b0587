//! Configuration loading and environment variable handling

use crate::domains::utils::split_list;
use crate::domains::EventLoadConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "EVENTLOAD".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<EventLoadConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: EventLoadConfig = serde_yaml::from_str(&content)?;

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<EventLoadConfig> {
        let mut config = EventLoadConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<EventLoadConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut EventLoadConfig) -> ConfigResult<()> {
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_auth_overrides(&mut config.auth);
        self.apply_endpoint_overrides(&mut config.endpoints);
        self.apply_load_test_overrides(&mut config.load_test)?;
        Ok(())
    }

    /// Apply HTTP config overrides
    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Some(seconds) = self.parse_env_var::<u64>("HTTP_TIMEOUT")? {
            config.timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Some(verify_ssl) = self.parse_env_var::<bool>("HTTP_VERIFY_SSL")? {
            config.verify_ssl = verify_ssl;
        }

        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Some(level) = self.parse_env_var("LOG_LEVEL")? {
            config.level = level;
        }

        if let Some(format) = self.parse_env_var("LOG_FORMAT")? {
            config.format = format;
        }

        Ok(())
    }

    fn apply_auth_overrides(&self, config: &mut crate::domains::auth::AuthConfig) {
        if let Ok(token) = self.get_env_var("TOKEN") {
            config.token = token.trim().to_string();
        }
    }

    fn apply_endpoint_overrides(&self, config: &mut crate::domains::endpoints::EndpointsConfig) {
        if let Ok(environment) = self.get_env_var("ENVIRONMENT") {
            config.environment = environment.trim().to_string();
        }
    }

    /// Apply load test overrides; these mirror the stress-test `.env` variables
    fn apply_load_test_overrides(
        &self,
        config: &mut crate::domains::load_test::LoadTestConfig,
    ) -> ConfigResult<()> {
        if let Ok(feed) = self.get_env_var("FEED") {
            config.feed = feed.trim().to_string();
        }

        if let Ok(types) = self.get_env_var("TYPES") {
            config.types = split_list(&types);
        }

        if let Some(limit) = self.parse_env_var("LIMIT")? {
            config.limit = limit;
        }

        if let Some(filter) = self.parse_env_var("EPISODE_FILTER_TYPE")? {
            config.episode_filter_type = filter;
        }

        if let Ok(bbox) = self.get_env_var("BBOX") {
            config.bbox = parse_bbox(&bbox)
                .map_err(|e| ConfigError::EnvError(format!("Invalid BBOX: {}", e)))?;
        }

        if let Ok(after) = self.get_env_var("AFTER") {
            config.after = after.trim().to_string();
        }

        if let Some(step) = self.parse_env_var("SHIFT_STEP")? {
            config.shift_step = step;
        }

        if let Some(count) = self.parse_env_var("NUMBER_OF_REQUESTS")? {
            config.number_of_requests = count;
        }

        if let Some(per_batch) = self.parse_env_var("REQUESTS_PER_BATCH")? {
            config.requests_per_batch = per_batch;
        }

        if let Some(millis) = self.parse_env_var::<u64>("PAUSE_BETWEEN_BATCHES_MS")? {
            config.pause_between_batches = std::time::Duration::from_millis(millis);
        }

        if let Ok(dir) = self.get_env_var("OUTPUT_DIR") {
            config.output_dir = dir.trim().into();
        }

        Ok(())
    }

    /// Parse an optional env var, failing loudly when it is set but malformed
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `minLon,minLat,maxLon,maxLat`
pub fn parse_bbox(raw: &str) -> Result<[f64; 4], String> {
    let values = split_list(raw)
        .iter()
        .map(|v| v.parse::<f64>().map_err(|e| format!("'{}': {}", v, e)))
        .collect::<Result<Vec<_>, _>>()?;

    <[f64; 4]>::try_from(values.as_slice())
        .map_err(|_| format!("expected 4 coordinates, got {}", values.len()))
}
