//! Load test parameters: query filters, request volume and pacing

use crate::error::ConfigResult;
use crate::validation::{
    validate_positive, validate_required_string, validate_timestamp, Validatable,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Episode filter accepted by the event search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EpisodeFilterType {
    Any,
    #[default]
    None,
    Latest,
}

impl EpisodeFilterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeFilterType::Any => "ANY",
            EpisodeFilterType::None => "NONE",
            EpisodeFilterType::Latest => "LATEST",
        }
    }
}

impl fmt::Display for EpisodeFilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpisodeFilterType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ANY" => Ok(EpisodeFilterType::Any),
            "NONE" => Ok(EpisodeFilterType::None),
            "LATEST" => Ok(EpisodeFilterType::Latest),
            other => Err(format!(
                "Invalid episode filter type '{}'. Valid choices: ANY, NONE, LATEST",
                other
            )),
        }
    }
}

/// Load test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadTestConfig {
    /// Upstream data partition queried by every request
    pub feed: String,

    /// Disaster types filter
    pub types: Vec<String>,

    /// Page size requested from the search endpoint
    pub limit: u32,

    pub episode_filter_type: EpisodeFilterType,

    /// Starting bounding box: min lon, min lat, max lon, max lat
    pub bbox: [f64; 4],

    /// Starting `after` cursor (ISO-8601)
    pub after: String,

    /// Amount added to every bbox coordinate per request index
    pub shift_step: f64,

    /// Total requests to prepare for the search scenario
    pub number_of_requests: usize,

    /// Requests dispatched concurrently in one batch
    pub requests_per_batch: usize,

    /// Pause between consecutive batches
    #[serde(
        rename = "pause_between_batches_ms",
        with = "crate::domains::utils::serde_duration_millis"
    )]
    pub pause_between_batches: Duration,

    /// How many sampled ids/urls end up in a summary
    pub sample_size: usize,

    /// Directory receiving results, summary and report files
    pub output_dir: PathBuf,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            feed: "pdc".to_string(),
            types: ["FLOOD", "WILDFIRE", "EARTHQUAKE", "CYCLONE", "STORM"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            limit: 1000,
            episode_filter_type: EpisodeFilterType::None,
            bbox: [-93.2175, 30.198, -93.2165, 30.199],
            after: "2024-02-13T23:20:50.52Z".to_string(),
            shift_step: 0.00001,
            number_of_requests: 80,
            requests_per_batch: 10,
            pause_between_batches: Duration::from_millis(6000),
            sample_size: 10,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Validatable for LoadTestConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.feed, "feed", self.domain_name())?;
        validate_positive(self.limit, "limit", self.domain_name())?;
        validate_positive(self.requests_per_batch, "requests_per_batch", self.domain_name())?;
        validate_positive(self.sample_size, "sample_size", self.domain_name())?;
        validate_timestamp(&self.after, "after", self.domain_name())?;

        if self.bbox.iter().any(|c| !c.is_finite()) {
            return Err(self.validation_error("bbox coordinates must be finite numbers"));
        }
        if !self.shift_step.is_finite() {
            return Err(self.validation_error("shift_step must be a finite number"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load_test"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LoadTestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pause_between_batches, Duration::from_millis(6000));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = LoadTestConfig {
            requests_per_batch: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_count_below_batch_size_is_accepted() {
        // The partial batch is dropped at run time, not at load time
        let config = LoadTestConfig {
            number_of_requests: 3,
            requests_per_batch: 10,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_after_timestamp_is_rejected() {
        let config = LoadTestConfig {
            after: "yesterday".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_episode_filter_type_parsing() {
        assert_eq!("latest".parse::<EpisodeFilterType>().unwrap(), EpisodeFilterType::Latest);
        assert_eq!(EpisodeFilterType::Any.to_string(), "ANY");
        assert!("ALL".parse::<EpisodeFilterType>().is_err());
    }
}
