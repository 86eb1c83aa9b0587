//! Metrics-instrumented HTTP fetcher

use crate::config::HttpConfig;
use crate::errors::{HttpError, ParseError};
use crate::record::RequestResult;
use crate::request::RequestDescriptor;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE},
    Client,
};
use serde_json::Value as JsonValue;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A [`RequestResult`] together with the parsed body, when there is one
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub result: RequestResult,
    pub body: Option<JsonValue>,
}

/// Executes one request and reports what happened.
///
/// Implementations never fail: transport and parse problems end up in
/// [`RequestResult::error`].
#[async_trait]
pub trait MetricsFetcher: Send + Sync {
    async fn fetch_with_metrics(&self, request: &RequestDescriptor) -> FetchOutcome;
}

/// Best-effort JSON parse of a raw response body
pub fn parse_body(raw: &[u8]) -> Result<JsonValue, ParseError> {
    Ok(serde_json::from_slice(raw)?)
}

/// reqwest-backed fetcher sending the fixed load-test headers
#[derive(Debug, Clone)]
pub struct HttpMetricsClient {
    client: Client,
    config: HttpConfig,
}

impl HttpMetricsClient {
    /// Build a client that authenticates every request with `token`
    pub fn new(config: HttpConfig, token: &str) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| HttpError::InvalidHeader("Authorization"))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        debug!(
            "Creating HTTP client with {}s timeout",
            config.timeout.as_secs()
        );
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::limited(
                config.max_redirects as usize,
            ))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl MetricsFetcher for HttpMetricsClient {
    async fn fetch_with_metrics(&self, request: &RequestDescriptor) -> FetchOutcome {
        let url = request.url();
        let mut result = RequestResult::pending(Utc::now(), url.as_str());
        debug!("{} {}", request.method(), url);

        let mut outgoing = self
            .client
            .request(request.method().into(), url.clone());
        if let Some(body) = request.body() {
            outgoing = outgoing.json(body);
        }

        let started = Instant::now();
        let response = match outgoing.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = describe_transport_error(&e);
                warn!("Request to {} failed: {}", url, message);
                result.error = Some(message);
                return FetchOutcome { result, body: None };
            }
        };
        result.response_status = response.status().as_u16();

        // Latency covers the body read but not the JSON parse
        let raw = response.bytes().await;
        result.response_time_ms = started.elapsed().as_millis() as u64;

        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                let message = describe_transport_error(&e);
                warn!(
                    "Reading body from {} (status {}) failed: {}",
                    url, result.response_status, message
                );
                result.error = Some(message);
                return FetchOutcome { result, body: None };
            }
        };
        result.payload_size = raw.len() as u64;

        match parse_body(&raw) {
            Ok(body) => FetchOutcome {
                result,
                body: Some(body),
            },
            Err(e) => {
                warn!(
                    "Response from {} (status {}) is not JSON: {}",
                    url, result.response_status, e
                );
                result.error = Some(e.to_string());
                FetchOutcome { result, body: None }
            }
        }
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    let kind = if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connection failed"
    } else if error.is_redirect() {
        "redirect limit exceeded"
    } else if error.is_body() || error.is_decode() {
        "body read failed"
    } else {
        "request failed"
    };
    format!("{}: {}", kind, error)
}
