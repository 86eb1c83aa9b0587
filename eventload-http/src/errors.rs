//! HTTP error types
//!
//! Everything here is a configuration-class failure raised before a request
//! is dispatched. Failures of a dispatched request are data, see
//! [`crate::RequestResult::error`].

/// Error type for request building and client setup
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Unknown endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Parameter '{name}' is not defined in {url}")]
    MissingParam { name: String, url: String },

    #[error("Parameter '{name}' has malformed value '{value}': {reason}")]
    MalformedParam {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// A response body that is not valid JSON
#[derive(Debug, thiserror::Error)]
#[error("Invalid JSON body: {0}")]
pub struct ParseError(#[from] serde_json::Error);
