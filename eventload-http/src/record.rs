//! Per-request result records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `response_status` of a request that never received an HTTP response
pub const STATUS_NOT_RECEIVED: u16 = 0;

/// One executed HTTP call.
///
/// Failures are recorded here rather than returned as errors: a transport
/// failure leaves `response_status` at [`STATUS_NOT_RECEIVED`], a body that
/// cannot be parsed keeps the real status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    pub start_time: DateTime<Utc>,
    pub url: String,
    pub response_status: u16,
    pub response_time_ms: u64,
    pub payload_size: u64,
    /// Sorted, comma-joined identifiers pulled from the body
    #[serde(default, alias = "disasterIds")]
    pub extracted_ids: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl RequestResult {
    /// Record for a request dispatched at `start_time` that has not completed yet
    pub fn pending(start_time: DateTime<Utc>, url: impl Into<String>) -> Self {
        Self {
            start_time,
            url: url.into(),
            response_status: STATUS_NOT_RECEIVED,
            response_time_ms: 0,
            payload_size: 0,
            extracted_ids: String::new(),
            error: None,
        }
    }

    /// 200 and 204 count as success; everything else, including the
    /// not-received sentinel, is a failure.
    pub fn is_success(&self) -> bool {
        matches!(self.response_status, 200 | 204)
    }

    pub fn received_response(&self) -> bool {
        self.response_status != STATUS_NOT_RECEIVED
    }
}
