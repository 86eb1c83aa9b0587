//! Settings of the HTTP client used by the load runs

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Redirect chains longer than this are almost certainly loops
const MAX_REDIRECT_LIMIT: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds. A request that runs past it is
    /// recorded as failed with status 0.
    #[serde(with = "crate::domains::utils::serde_duration")]
    pub timeout: Duration,

    pub max_redirects: u32,

    /// Sent on every request, load and discovery alike
    pub user_agent: String,

    /// Set to false to test against staging hosts with self-signed certificates
    pub verify_ssl: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: concat!("eventload/", env!("CARGO_PKG_VERSION")).to_string(),
            verify_ssl: true,
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_secs(), "timeout", self.domain_name())?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;

        if self.max_redirects > MAX_REDIRECT_LIMIT {
            return Err(self.validation_error(format!(
                "max_redirects is {}, the limit is {}",
                self.max_redirects, MAX_REDIRECT_LIMIT
            )));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}
