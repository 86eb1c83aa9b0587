//! Event API load scenarios
//!
//! Every scenario builds its requests up front, so configuration problems
//! surface before the first load request is sent, then runs them through
//! [`run_in_batches`] and aggregates the results.

use crate::analytics::{AggregatedSummary, Aggregator, TestMetadata};
use crate::batch::{run_in_batches, BatchRunConfiguration};
use crate::error::{RunnerError, RunnerResult};
use eventload_config::domains::endpoints::{EVENT_OBSERVATIONS, EVENT_RETURN, EVENT_SEARCH};
use eventload_config::LoadTestConfig;
use eventload_http::{
    advance_timestamp_param, shift_numeric_range_param, EndpointRegistry, MetricsFetcher,
    QueryParams, RequestBuilder, RequestDescriptor, RequestResult,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Extracts the identifiers recorded for one response body
type IdExtractor = fn(&JsonValue) -> String;

/// The load scenarios this harness knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    /// Paged search with a moving bbox and time cursor
    SearchEvents,
    /// Fetch every discovered event by id
    ReturnEvents,
    /// Fetch every discovered observation by id
    ReturnObservations,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [
        Scenario::SearchEvents,
        Scenario::ReturnEvents,
        Scenario::ReturnObservations,
    ];

    /// Kebab-case name, used for output file names
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::SearchEvents => "search-events",
            Scenario::ReturnEvents => "return-events",
            Scenario::ReturnObservations => "return-observations",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ids found by the pre-flight discovery search
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Unique, sorted
    pub event_ids: Vec<String>,
    /// Unique, sorted, flattened from every event
    pub observation_ids: Vec<String>,
    pub result: RequestResult,
}

/// Everything a finished scenario produced
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub results: Vec<RequestResult>,
    pub summary: AggregatedSummary,
}

/// `data[].eventId`, sorted and joined with `", "`
pub fn extract_event_ids(body: &JsonValue) -> String {
    let mut ids: Vec<&str> = body
        .get("data")
        .and_then(JsonValue::as_array)
        .map(|events| {
            events
                .iter()
                .filter_map(|event| event.get("eventId").and_then(JsonValue::as_str))
                .collect()
        })
        .unwrap_or_default();
    ids.sort_unstable();
    ids.join(", ")
}

/// `eventId` of a single returned event, empty when absent
pub fn extract_returned_event_id(body: &JsonValue) -> String {
    body.get("eventId")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}

fn no_ids(_: &JsonValue) -> String {
    String::new()
}

fn collect_strings(value: &JsonValue, into: &mut BTreeSet<String>) {
    match value {
        JsonValue::String(s) => {
            into.insert(s.clone());
        }
        JsonValue::Array(items) => items.iter().for_each(|item| collect_strings(item, into)),
        _ => {}
    }
}

/// Runs scenarios against one endpoint registry with one fetcher
pub struct ScenarioRunner<'a, F> {
    fetcher: &'a F,
    registry: &'a EndpointRegistry,
    config: &'a LoadTestConfig,
}

impl<'a, F: MetricsFetcher> ScenarioRunner<'a, F> {
    pub fn new(fetcher: &'a F, registry: &'a EndpointRegistry, config: &'a LoadTestConfig) -> Self {
        Self {
            fetcher,
            registry,
            config,
        }
    }

    pub async fn run(&self, scenario: Scenario) -> RunnerResult<ScenarioReport> {
        info!("Running {} scenario", scenario);
        match scenario {
            Scenario::SearchEvents => self.search_events().await,
            Scenario::ReturnEvents => self.return_events().await,
            Scenario::ReturnObservations => self.return_observations().await,
        }
    }

    /// Request `i` shifts the bbox by `shift_step * (i + 1)` and moves the
    /// `after` cursor forward by `i` minutes.
    pub fn search_requests(&self) -> RunnerResult<Vec<RequestDescriptor>> {
        let config = self.config;
        let params = self
            .discovery_params()
            .with("episodeFilterType", config.episode_filter_type.as_str())
            .with("bbox", config.bbox.to_vec())
            .with("after", &config.after);
        let template = RequestBuilder::new(self.registry).build(EVENT_SEARCH, params, None)?;

        (0..config.number_of_requests)
            .map(|i| -> RunnerResult<RequestDescriptor> {
                let index = i as i64;
                let request = template.derive(|url| {
                    let shifted =
                        shift_numeric_range_param(url, "bbox", config.shift_step, index + 1)?;
                    advance_timestamp_param(&shifted, "after", index)
                })?;
                Ok(request)
            })
            .collect()
    }

    /// Search once for every event of the configured feed and collect ids.
    ///
    /// Anything but a parsable 200 response is fatal.
    pub async fn discover_events(&self) -> RunnerResult<Discovery> {
        let request =
            RequestBuilder::new(self.registry).build(EVENT_SEARCH, self.discovery_params(), None)?;
        info!("Discovering events at {}", request.url());

        let outcome = self.fetcher.fetch_with_metrics(&request).await;
        let result = outcome.result;
        if result.response_status != 200 {
            return Err(RunnerError::Discovery(format!(
                "search returned status {}{}",
                result.response_status,
                result
                    .error
                    .as_deref()
                    .map(|e| format!(" ({})", e))
                    .unwrap_or_default()
            )));
        }

        let body = outcome.body.ok_or_else(|| {
            RunnerError::Discovery(format!(
                "search response could not be parsed: {}",
                result.error.as_deref().unwrap_or("empty body")
            ))
        })?;
        let events = body
            .get("data")
            .and_then(JsonValue::as_array)
            .ok_or_else(|| RunnerError::Discovery("search response has no data array".to_string()))?;

        let mut event_ids = BTreeSet::new();
        let mut observation_ids = BTreeSet::new();
        for event in events {
            if let Some(id) = event.get("eventId").and_then(JsonValue::as_str) {
                event_ids.insert(id.to_string());
            }
            if let Some(observations) = event.get("observations") {
                collect_strings(observations, &mut observation_ids);
            }
        }

        info!(
            "Discovered {} events and {} observations in {}ms",
            event_ids.len(),
            observation_ids.len(),
            result.response_time_ms
        );
        Ok(Discovery {
            event_ids: event_ids.into_iter().collect(),
            observation_ids: observation_ids.into_iter().collect(),
            result,
        })
    }

    fn discovery_params(&self) -> QueryParams {
        QueryParams::new()
            .with("feed", &self.config.feed)
            .with("types", self.config.types.clone())
            .with("limit", self.config.limit)
    }

    async fn search_events(&self) -> RunnerResult<ScenarioReport> {
        let requests = self.search_requests()?;
        let metadata = TestMetadata::for_search(self.config);
        self.execute(Scenario::SearchEvents, requests, extract_event_ids, metadata)
            .await
    }

    async fn return_events(&self) -> RunnerResult<ScenarioReport> {
        let discovery = self.discover_events().await?;
        let requests = self.lookups(EVENT_RETURN, &discovery.event_ids)?;
        let metadata = TestMetadata::for_discovery(self.config, requests.len());
        self.execute(
            Scenario::ReturnEvents,
            requests,
            extract_returned_event_id,
            metadata,
        )
        .await
    }

    async fn return_observations(&self) -> RunnerResult<ScenarioReport> {
        let discovery = self.discover_events().await?;
        let requests = self.lookups(EVENT_OBSERVATIONS, &discovery.observation_ids)?;
        let metadata = TestMetadata::for_discovery(self.config, requests.len());
        self.execute(Scenario::ReturnObservations, requests, no_ids, metadata)
            .await
    }

    /// One request per id, with the id appended to the endpoint path
    fn lookups(&self, endpoint: &str, ids: &[String]) -> RunnerResult<Vec<RequestDescriptor>> {
        let builder = RequestBuilder::new(self.registry);
        ids.iter()
            .map(|id| {
                builder
                    .build(endpoint, QueryParams::new(), Some(id.as_str()))
                    .map_err(RunnerError::from)
            })
            .collect()
    }

    async fn execute(
        &self,
        scenario: Scenario,
        requests: Vec<RequestDescriptor>,
        extract: IdExtractor,
        metadata: TestMetadata,
    ) -> RunnerResult<ScenarioReport> {
        let batches = BatchRunConfiguration::new(
            requests.len(),
            self.config.requests_per_batch,
            self.config.pause_between_batches,
        )?;
        info!(
            "{}: {} requests in {} batches of {}",
            scenario,
            batches.executed_requests(),
            batches.number_of_batches(),
            batches.requests_per_batch()
        );

        let fetcher = self.fetcher;
        let tasks: Vec<_> = requests
            .into_iter()
            .map(|request| {
                move || async move {
                    let outcome = fetcher.fetch_with_metrics(&request).await;
                    let mut result = outcome.result;
                    if let Some(body) = outcome.body {
                        result.extracted_ids = extract(&body);
                    }
                    result
                }
            })
            .collect();

        let output = run_in_batches(
            tasks,
            batches.requests_per_batch(),
            batches.pause_between_batches(),
        )
        .await?;
        debug!(
            "{} finished with {} results, {} without a response",
            scenario,
            output.results.len(),
            output.results.iter().filter(|r| !r.received_response()).count()
        );

        let metadata = metadata.with_testing_time_ms(output.elapsed_ms());
        let summary = Aggregator::new(self.config.sample_size).aggregate(&output.results, metadata);
        Ok(ScenarioReport {
            scenario,
            results: output.results,
            summary,
        })
    }
}
