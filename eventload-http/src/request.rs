//! Request descriptors and the builder that resolves logical endpoints

use crate::errors::HttpError;
use crate::types::HttpMethod;
use eventload_config::EndpointsConfig;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

/// A query parameter value: a scalar, a list of scalars, or nothing at all
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ParamValue>),
    Null,
}

impl ParamValue {
    /// Query-string form; `None` means the parameter is omitted.
    /// Lists are comma-joined, with null members skipped.
    pub fn to_query_value(&self) -> Option<String> {
        match self {
            ParamValue::Text(s) => Some(s.clone()),
            ParamValue::Integer(i) => Some(i.to_string()),
            ParamValue::Float(f) => Some(f.to_string()),
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::List(items) => Some(
                items
                    .iter()
                    .filter_map(ParamValue::to_query_value)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            ParamValue::Null => None,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue> + Clone> From<&[T]> for ParamValue {
    fn from(values: &[T]) -> Self {
        ParamValue::List(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Null, Into::into)
    }
}

/// Ordered query parameters; insertion order is the order on the wire
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams(Vec<(String, ParamValue)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One logical request, built once and never changed afterwards.
///
/// Related requests are derived with [`RequestDescriptor::derive`], which
/// leaves the original untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    endpoint: String,
    params: QueryParams,
    extra_path: Option<String>,
    method: HttpMethod,
    body: Option<JsonValue>,
    url: Url,
}

impl RequestDescriptor {
    /// Logical endpoint name this request was built from
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn extra_path(&self) -> Option<&str> {
        self.extra_path.as_deref()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn body(&self) -> Option<&JsonValue> {
        self.body.as_ref()
    }

    /// Fully materialized URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Turn this into a POST carrying a JSON body (GraphQL-style endpoints)
    pub fn with_json_body(mut self, body: JsonValue) -> Self {
        self.method = HttpMethod::Post;
        self.body = Some(body);
        self
    }

    /// Derive a new descriptor whose URL is produced by `f`
    pub fn derive<F>(&self, f: F) -> Result<RequestDescriptor, HttpError>
    where
        F: FnOnce(&Url) -> Result<Url, HttpError>,
    {
        let url = f(&self.url)?;
        Ok(RequestDescriptor {
            url,
            ..self.clone()
        })
    }
}

/// Logical endpoint name -> base URL for one environment
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, Url>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the endpoints active in the configured environment
    pub fn from_config(config: &EndpointsConfig) -> Result<Self, HttpError> {
        let mut registry = Self::new();
        for (name, url) in config.active() {
            registry.insert(name, &url)?;
        }
        debug!(
            "Endpoint registry for '{}' holds {} endpoints",
            config.environment,
            registry.endpoints.len()
        );
        Ok(registry)
    }

    pub fn insert(&mut self, name: impl Into<String>, url: &str) -> Result<(), HttpError> {
        let parsed = Url::parse(url).map_err(|source| HttpError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        self.endpoints.insert(name.into(), parsed);
        Ok(())
    }

    pub fn base_url(&self, name: &str) -> Option<&Url> {
        self.endpoints.get(name)
    }
}

/// Builds [`RequestDescriptor`]s against an [`EndpointRegistry`]
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    registry: &'a EndpointRegistry,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(registry: &'a EndpointRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `endpoint`, append `extra_path` to its base path and encode
    /// `params` as the query string. Null parameters are omitted.
    pub fn build(
        &self,
        endpoint: &str,
        params: QueryParams,
        extra_path: Option<&str>,
    ) -> Result<RequestDescriptor, HttpError> {
        let base = self
            .registry
            .base_url(endpoint)
            .ok_or_else(|| HttpError::UnknownEndpoint(endpoint.to_string()))?;

        let raw = match extra_path {
            Some(extra) => format!("{}{}", base.as_str(), extra),
            None => base.as_str().to_string(),
        };
        let mut url = Url::parse(&raw).map_err(|source| HttpError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;

        let encoded: Vec<(&str, String)> = params
            .iter()
            .filter_map(|(name, value)| value.to_query_value().map(|v| (name, v)))
            .collect();
        if !encoded.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &encoded {
                pairs.append_pair(name, value);
            }
        }

        Ok(RequestDescriptor {
            endpoint: endpoint.to_string(),
            params,
            extra_path: extra_path.map(str::to_string),
            method: HttpMethod::Get,
            body: None,
            url,
        })
    }
}
