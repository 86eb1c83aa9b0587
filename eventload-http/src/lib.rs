//! HTTP plumbing for eventload
//!
//! This crate turns logical endpoint names plus query parameters into
//! concrete request descriptors, derives related requests from them
//! (shifted bounding boxes, advanced time cursors), and executes them with a
//! fetcher that measures latency and payload size and never fails: every
//! transport or parse problem is captured in the returned [`RequestResult`].

pub mod client;
pub mod config;
pub mod errors;
pub mod mutation;
pub mod record;
pub mod request;
pub mod types;

// Re-export main types for convenience
pub use client::{parse_body, FetchOutcome, HttpMetricsClient, MetricsFetcher};
pub use config::HttpConfig;
pub use errors::{HttpError, ParseError};
pub use mutation::{advance_timestamp_param, shift_numeric_range_param};
pub use record::{RequestResult, STATUS_NOT_RECEIVED};
pub use request::{EndpointRegistry, ParamValue, QueryParams, RequestBuilder, RequestDescriptor};
pub use types::HttpMethod;
