//! Endpoint catalogue configuration
//!
//! Every logical endpoint the harness can hit is listed once per deployment
//! environment. Only entries matching the selected `environment` resolve.

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Logical name of the event search endpoint
pub const EVENT_SEARCH: &str = "event api search";
/// Logical name of the single event lookup endpoint
pub const EVENT_RETURN: &str = "event api return event";
/// Logical name of the raw observation lookup endpoint
pub const EVENT_OBSERVATIONS: &str = "event api raw data (observations)";

/// A single named endpoint in one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub env: String,
    pub url: String,
}

/// Endpoint catalogue plus the environment selector
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Environment whose endpoints are active (prod, test, dev, ...)
    pub environment: String,

    /// All known endpoints across environments
    pub endpoints: Vec<EndpointConfig>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        let prod = |name: &str, url: &str| EndpointConfig {
            name: name.to_string(),
            env: "prod".to_string(),
            url: url.to_string(),
        };
        Self {
            environment: "prod".to_string(),
            endpoints: vec![
                prod(EVENT_SEARCH, "https://apps.kontur.io/events/v1/"),
                prod(EVENT_RETURN, "https://apps.kontur.io/events/v1/event/"),
                prod(EVENT_OBSERVATIONS, "https://apps.kontur.io/events/v1/observations/"),
            ],
        }
    }
}

impl EndpointsConfig {
    /// Name -> base URL for the selected environment
    pub fn active(&self) -> HashMap<String, String> {
        self.endpoints
            .iter()
            .filter(|e| e.env == self.environment)
            .map(|e| (e.name.clone(), e.url.clone()))
            .collect()
    }
}

impl Validatable for EndpointsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.environment, "environment", self.domain_name())?;

        let mut seen = std::collections::HashSet::new();
        for endpoint in &self.endpoints {
            validate_required_string(&endpoint.name, "name", self.domain_name())?;
            validate_url(&endpoint.url, &endpoint.name, self.domain_name())?;
            if !seen.insert((endpoint.env.as_str(), endpoint.name.as_str())) {
                return Err(self.validation_error(format!(
                    "endpoint '{}' is defined twice for environment '{}'",
                    endpoint.name, endpoint.env
                )));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "endpoints"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_event_endpoints() {
        let config = EndpointsConfig::default();
        assert!(config.validate().is_ok());
        let active = config.active();
        assert_eq!(
            active.get(EVENT_SEARCH).map(String::as_str),
            Some("https://apps.kontur.io/events/v1/")
        );
        assert_eq!(active.len(), 3);
    }

    #[test]
    fn test_active_respects_environment() {
        let mut config = EndpointsConfig::default();
        config.endpoints.push(EndpointConfig {
            name: EVENT_SEARCH.to_string(),
            env: "test".to_string(),
            url: "https://test-apps.kontur.io/events/v1/".to_string(),
        });
        config.environment = "test".to_string();

        let active = config.active();
        assert_eq!(
            active.get(EVENT_SEARCH).map(String::as_str),
            Some("https://test-apps.kontur.io/events/v1/")
        );
        assert!(!active.contains_key(EVENT_RETURN));
    }

    #[test]
    fn test_duplicate_endpoint_is_rejected() {
        let mut config = EndpointsConfig::default();
        let dup = config.endpoints[0].clone();
        config.endpoints.push(dup);
        assert!(config.validate().is_err());
    }
}
