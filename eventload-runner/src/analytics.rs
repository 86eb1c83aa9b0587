//! Reduction of per-request results into a run summary

use eventload_config::{EpisodeFilterType, LoadTestConfig};
use eventload_http::RequestResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Latency thresholds of the slow-request buckets, in milliseconds
pub const SLOW_THRESHOLDS_MS: [u64; 5] = [1_000, 3_000, 5_000, 10_000, 100_000];

/// Default number of sampled ids and urls kept in a summary
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Static description of a run, echoed into its summary unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    pub number_of_requests: usize,
    pub feed: Option<String>,
    pub types: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub episode_filter_type: Option<EpisodeFilterType>,
    pub starting_bbox: Option<[f64; 4]>,
    pub shift_bbox_coordinates_step: Option<f64>,
    pub starting_after_date: Option<String>,
    pub testing_time_ms: u64,
    #[serde(alias = "pauseBetweenBunchesOfRequestsMs")]
    pub pause_between_batches_ms: Option<u64>,
}

impl TestMetadata {
    /// Metadata of a search run: every search parameter is relevant
    pub fn for_search(config: &LoadTestConfig) -> Self {
        Self {
            number_of_requests: config.number_of_requests,
            feed: Some(config.feed.clone()),
            types: Some(config.types.clone()),
            limit: Some(config.limit),
            episode_filter_type: Some(config.episode_filter_type),
            starting_bbox: Some(config.bbox),
            shift_bbox_coordinates_step: Some(config.shift_step),
            starting_after_date: Some(config.after.clone()),
            testing_time_ms: 0,
            pause_between_batches_ms: Some(config.pause_between_batches.as_millis() as u64),
        }
    }

    /// Metadata of a run driven by a discovery search
    pub fn for_discovery(config: &LoadTestConfig, number_of_requests: usize) -> Self {
        Self {
            number_of_requests,
            feed: Some(config.feed.clone()),
            types: Some(config.types.clone()),
            limit: Some(config.limit),
            pause_between_batches_ms: Some(config.pause_between_batches.as_millis() as u64),
            ..Self::default()
        }
    }

    pub fn with_testing_time_ms(mut self, testing_time_ms: u64) -> Self {
        self.testing_time_ms = testing_time_ms;
        self
    }
}

/// Successful requests slower than each threshold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlowRequestBuckets {
    #[serde(rename = "moreThan1sec")]
    pub more_than_1_sec: usize,
    #[serde(rename = "moreThan3sec")]
    pub more_than_3_sec: usize,
    #[serde(rename = "moreThan5sec")]
    pub more_than_5_sec: usize,
    #[serde(rename = "moreThan10sec")]
    pub more_than_10_sec: usize,
    #[serde(rename = "moreThan100sec")]
    pub more_than_100_sec: usize,
}

impl SlowRequestBuckets {
    fn record(mut self, latency_ms: u64) -> Self {
        let counters = [
            &mut self.more_than_1_sec,
            &mut self.more_than_3_sec,
            &mut self.more_than_5_sec,
            &mut self.more_than_10_sec,
            &mut self.more_than_100_sec,
        ];
        for (threshold, counter) in SLOW_THRESHOLDS_MS.iter().zip(counters) {
            if latency_ms > *threshold {
                *counter += 1;
            }
        }
        self
    }

    /// Bucket names and counts, fastest threshold first
    pub fn entries(&self) -> [(&'static str, usize); 5] {
        [
            ("moreThan1sec", self.more_than_1_sec),
            ("moreThan3sec", self.more_than_3_sec),
            ("moreThan5sec", self.more_than_5_sec),
            ("moreThan10sec", self.more_than_10_sec),
            ("moreThan100sec", self.more_than_100_sec),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.more_than_1_sec == 0
    }
}

/// Summary of one run. Statistics over successful requests are `None` when
/// there were none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSummary {
    pub total_requests_number: usize,
    #[serde(rename = "notOKRequestsNumber")]
    pub not_ok_requests_number: usize,
    pub statuses: BTreeMap<u16, usize>,
    pub response_time_min: Option<u64>,
    pub response_time_max: Option<u64>,
    /// Latency sum of successful requests over the count of all requests
    pub response_time_avg_ms: Option<f64>,
    pub response_time_median_ms: Option<u64>,
    #[serde(rename = "responseTimeBelowWhich95PercentOfRequestsFitMs")]
    pub response_time_p95_ms: Option<u64>,
    #[serde(rename = "responseTimeBelowWhich99PercentOfRequestsFitMs")]
    pub response_time_p99_ms: Option<u64>,
    pub long_requests: SlowRequestBuckets,
    pub unique_errors: Vec<String>,
    #[serde(alias = "maxThreeUniqueDisasterIdsFound")]
    pub sampled_extracted_ids: Vec<String>,
    #[serde(alias = "maxThreeUniqueLastTestedUrls")]
    pub sampled_urls: Vec<String>,
    pub unique_payload_sizes: Vec<u64>,
    pub test_data: TestMetadata,
    pub testing_time_ms: u64,
}

/// Running state of the fold
#[derive(Debug, Default)]
struct Accumulator {
    total: usize,
    not_ok: usize,
    statuses: BTreeMap<u16, usize>,
    latencies: Vec<u64>,
    latency_sum: u64,
    min: Option<u64>,
    max: Option<u64>,
    long_requests: SlowRequestBuckets,
    errors: Vec<String>,
    ids: Vec<String>,
    urls: Vec<String>,
    payload_sizes: Vec<u64>,
}

impl Accumulator {
    fn step(mut self, result: &RequestResult) -> Self {
        self.total += 1;
        *self.statuses.entry(result.response_status).or_insert(0) += 1;

        if let Some(error) = &result.error {
            self.errors.push(error.clone());
        }

        if !result.is_success() {
            self.not_ok += 1;
            return self;
        }

        let latency = result.response_time_ms;
        self.latencies.push(latency);
        self.latency_sum += latency;
        self.min = Some(self.min.map_or(latency, |min| min.min(latency)));
        self.max = Some(self.max.map_or(latency, |max| max.max(latency)));
        self.long_requests = self.long_requests.record(latency);

        if !result.extracted_ids.is_empty() {
            self.ids.push(result.extracted_ids.clone());
        }
        self.urls.push(result.url.clone());
        self.payload_sizes.push(result.payload_size);
        self
    }

    fn finish(self, sample_size: usize, metadata: TestMetadata) -> AggregatedSummary {
        let mut sorted = self.latencies;
        sorted.sort_unstable();

        let response_time_avg_ms = if sorted.is_empty() {
            None
        } else {
            Some(self.latency_sum as f64 / self.total as f64)
        };

        let ids = unique_in_order(self.ids);
        let urls = unique_in_order(self.urls);
        let skip_urls = urls.len().saturating_sub(sample_size);

        AggregatedSummary {
            total_requests_number: self.total,
            not_ok_requests_number: self.not_ok,
            statuses: self.statuses,
            response_time_min: self.min,
            response_time_max: self.max,
            response_time_avg_ms,
            response_time_median_ms: nearest_rank(&sorted, 0.5),
            response_time_p95_ms: nearest_rank(&sorted, 0.95),
            response_time_p99_ms: nearest_rank(&sorted, 0.99),
            long_requests: self.long_requests,
            unique_errors: unique_in_order(self.errors),
            sampled_extracted_ids: ids.into_iter().take(sample_size).collect(),
            sampled_urls: urls.into_iter().skip(skip_urls).collect(),
            unique_payload_sizes: unique_in_order(self.payload_sizes),
            testing_time_ms: metadata.testing_time_ms,
            test_data: metadata,
        }
    }
}

/// Element at `floor(p * n)` of an ascending slice, without interpolation
fn nearest_rank(sorted: &[u64], p: f64) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }
    let index = ((p * sorted.len() as f64).floor() as usize).min(sorted.len() - 1);
    sorted.get(index).copied()
}

fn unique_in_order<T: Clone + Eq + std::hash::Hash>(values: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Aggregation with a configurable sample size
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    sample_size: usize,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SIZE)
    }
}

impl Aggregator {
    pub fn new(sample_size: usize) -> Self {
        Self { sample_size }
    }

    /// Pure: the same results and metadata always give the same summary
    pub fn aggregate(&self, results: &[RequestResult], metadata: TestMetadata) -> AggregatedSummary {
        results
            .iter()
            .fold(Accumulator::default(), Accumulator::step)
            .finish(self.sample_size, metadata)
    }
}

/// [`Aggregator::aggregate`] with the default sample size
pub fn aggregate(results: &[RequestResult], metadata: TestMetadata) -> AggregatedSummary {
    Aggregator::default().aggregate(results, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn result(status: u16, latency: u64) -> RequestResult {
        RequestResult {
            response_status: status,
            response_time_ms: latency,
            payload_size: 512,
            ..RequestResult::pending(Utc::now(), format!("https://apps.example.org/?n={}", latency))
        }
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let results: Vec<_> = [300, 500, 100, 400, 200]
            .into_iter()
            .map(|ms| result(200, ms))
            .collect();
        let summary = aggregate(&results, TestMetadata::default());

        assert_eq!(summary.response_time_median_ms, Some(300));
        assert_eq!(summary.response_time_p95_ms, Some(500));
        assert_eq!(summary.response_time_p99_ms, Some(500));
        assert_eq!(summary.response_time_min, Some(100));
        assert_eq!(summary.response_time_max, Some(500));
        assert_eq!(summary.response_time_avg_ms, Some(300.0));
    }

    #[test]
    fn test_percentiles_on_larger_sample() {
        let results: Vec<_> = (1..=100).map(|ms| result(200, ms)).collect();
        let summary = aggregate(&results, TestMetadata::default());
        assert_eq!(summary.response_time_median_ms, Some(51));
        assert_eq!(summary.response_time_p95_ms, Some(96));
        assert_eq!(summary.response_time_p99_ms, Some(100));
    }

    #[test]
    fn test_mean_divides_by_total_count() {
        let results = vec![result(200, 100), result(200, 300), result(500, 9_000), result(0, 0)];
        let summary = aggregate(&results, TestMetadata::default());

        assert_eq!(summary.response_time_avg_ms, Some(100.0));
        assert_eq!(summary.not_ok_requests_number, 2);
        assert_eq!(summary.response_time_max, Some(300));
    }

    #[test]
    fn test_status_histogram_counts_every_result() {
        let results = vec![
            result(200, 10),
            result(204, 20),
            result(404, 30),
            result(0, 0),
            result(200, 40),
        ];
        let summary = aggregate(&results, TestMetadata::default());

        assert_eq!(summary.statuses.values().sum::<usize>(), results.len());
        assert_eq!(summary.statuses.get(&200), Some(&2));
        assert_eq!(summary.statuses.get(&0), Some(&1));
        assert_eq!(summary.total_requests_number, 5);
    }

    #[test]
    fn test_empty_input_leaves_statistics_undefined() {
        let summary = aggregate(&[], TestMetadata::default());
        assert_eq!(summary.total_requests_number, 0);
        assert!(summary.statuses.is_empty());
        assert_eq!(summary.response_time_min, None);
        assert_eq!(summary.response_time_avg_ms, None);
        assert_eq!(summary.response_time_median_ms, None);
        assert_eq!(summary.response_time_p99_ms, None);
    }

    #[test]
    fn test_all_failures_leave_statistics_undefined() {
        let mut failed = result(0, 0);
        failed.error = Some("connection failed: refused".to_string());
        let summary = aggregate(&[failed.clone(), failed], TestMetadata::default());

        assert_eq!(summary.not_ok_requests_number, 2);
        assert_eq!(summary.response_time_median_ms, None);
        assert_eq!(summary.response_time_avg_ms, None);
        assert_eq!(summary.unique_errors, vec!["connection failed: refused"]);
    }

    #[test]
    fn test_unique_errors_include_successful_responses_with_errors() {
        let mut a = result(200, 10);
        a.error = Some("Invalid JSON body: EOF".to_string());
        let mut b = result(502, 10);
        b.error = Some("Invalid JSON body: expected value".to_string());
        let mut c = result(502, 10);
        c.error = Some("Invalid JSON body: expected value".to_string());

        let summary = aggregate(&[a, b, c, result(200, 10)], TestMetadata::default());
        assert_eq!(
            summary.unique_errors,
            vec!["Invalid JSON body: EOF", "Invalid JSON body: expected value"]
        );
    }

    #[test]
    fn test_slow_buckets_use_strict_thresholds() {
        let results = vec![
            result(200, 1_000),
            result(200, 1_001),
            result(200, 5_500),
            result(200, 150_000),
            result(500, 200_000),
        ];
        let summary = aggregate(&results, TestMetadata::default());
        assert_eq!(
            summary.long_requests,
            SlowRequestBuckets {
                more_than_1_sec: 3,
                more_than_3_sec: 2,
                more_than_5_sec: 2,
                more_than_10_sec: 1,
                more_than_100_sec: 1,
            }
        );
    }

    #[test]
    fn test_samples_are_deduplicated_and_bounded() {
        let mut results = Vec::new();
        for i in 0..6 {
            let mut r = result(200, 10);
            r.url = format!("https://apps.example.org/?page={}", i % 4);
            r.extracted_ids = if i == 2 { String::new() } else { format!("e{}", i % 3) };
            r.payload_size = if i % 2 == 0 { 100 } else { 200 };
            results.push(r);
        }

        let summary = Aggregator::new(2).aggregate(&results, TestMetadata::default());
        assert_eq!(summary.sampled_extracted_ids, vec!["e0", "e1"]);
        assert_eq!(
            summary.sampled_urls,
            vec![
                "https://apps.example.org/?page=2",
                "https://apps.example.org/?page=3"
            ]
        );
        assert_eq!(summary.unique_payload_sizes, vec![100, 200]);
    }

    #[test]
    fn test_metadata_is_echoed() {
        let config = LoadTestConfig::default();
        let metadata = TestMetadata::for_search(&config).with_testing_time_ms(48_123);
        let summary = aggregate(&[result(200, 10)], metadata.clone());

        assert_eq!(summary.test_data, metadata);
        assert_eq!(summary.testing_time_ms, 48_123);
        assert_eq!(summary.test_data.feed.as_deref(), Some("pdc"));
    }

    #[test]
    fn test_summary_json_uses_report_keys() {
        let summary = aggregate(&[result(200, 10)], TestMetadata::default());
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["statuses"]["200"], 1);
        assert_eq!(value["notOKRequestsNumber"], 0);
        assert_eq!(value["longRequests"]["moreThan1sec"], 0);
        assert!(value.get("responseTimeBelowWhich95PercentOfRequestsFitMs").is_some());
    }

    #[test]
    fn test_summary_reads_older_key_names() {
        let legacy = serde_json::json!({
            "totalRequestsNumber": 2,
            "notOKRequestsNumber": 0,
            "statuses": {"200": 2},
            "responseTimeMin": 90,
            "responseTimeMax": 110,
            "responseTimeAvgMs": 100.0,
            "responseTimeMedianMs": 90,
            "responseTimeBelowWhich95PercentOfRequestsFitMs": 110,
            "responseTimeBelowWhich99PercentOfRequestsFitMs": 110,
            "longRequests": {
                "moreThan1sec": 0,
                "moreThan3sec": 0,
                "moreThan5sec": 0,
                "moreThan10sec": 0,
                "moreThan100sec": 0
            },
            "uniqueErrors": [],
            "maxThreeUniqueDisasterIdsFound": ["a, b"],
            "maxThreeUniqueLastTestedUrls": ["https://apps.example.org/?page=1"],
            "uniquePayloadSizes": [64],
            "testData": {
                "numberOfRequests": 2,
                "testingTimeMs": 250,
                "pauseBetweenBunchesOfRequestsMs": 6000
            },
            "testingTimeMs": 250
        });

        let summary: AggregatedSummary = serde_json::from_value(legacy).unwrap();
        assert_eq!(summary.sampled_extracted_ids, vec!["a, b"]);
        assert_eq!(summary.sampled_urls, vec!["https://apps.example.org/?page=1"]);
        assert_eq!(summary.test_data.pause_between_batches_ms, Some(6000));
        assert_eq!(summary.statuses.get(&200), Some(&2));
    }
}
