//! Plain-text rendering of a run summary

use crate::analytics::AggregatedSummary;
use std::fmt::Display;

const NOT_AVAILABLE: &str = "N/A";
const NONE: &str = "none";

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

fn join_or<T: Display>(values: &[T], separator: &str, empty: &str) -> String {
    if values.is_empty() {
        empty.to_string()
    } else {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Render `summary` as a multi-line report.
///
/// Undefined statistics print as `N/A`, empty collections as `none`.
pub fn render_report(summary: &AggregatedSummary) -> String {
    let meta = &summary.test_data;
    let mut lines = Vec::with_capacity(9);

    lines.push(format!(
        "Load test completed: ran {} requests ({} executed), feed={}, types={}, bbox=[{}], limit={}. Starting after value is '{}'. Episode filter type is {}.",
        meta.number_of_requests,
        summary.total_requests_number,
        meta.feed.as_deref().unwrap_or("unknown"),
        meta.types
            .as_deref()
            .map_or_else(|| NONE.to_string(), |t| join_or(t, ", ", NONE)),
        meta.starting_bbox
            .map_or_else(|| NOT_AVAILABLE.to_string(), |b| join_or(&b, ", ", NOT_AVAILABLE)),
        or_na(meta.limit),
        meta.starting_after_date.as_deref().unwrap_or(NOT_AVAILABLE),
        or_na(meta.episode_filter_type),
    ));
    lines.push(format!(
        "Bbox shift per request: {}. Running all requests took {}ms. Pause between batches was {}ms.",
        or_na(meta.shift_bbox_coordinates_step),
        summary.testing_time_ms,
        or_na(meta.pause_between_batches_ms),
    ));
    lines.push(format!(
        "Performance: avg response time is {}ms, median is {}ms, max is {}ms, min is {}ms, 95th percentile is {}ms, 99th percentile is {}ms.",
        or_na(summary.response_time_avg_ms.map(|avg| format!("{:.2}", avg))),
        or_na(summary.response_time_median_ms),
        or_na(summary.response_time_max),
        or_na(summary.response_time_min),
        or_na(summary.response_time_p95_ms),
        or_na(summary.response_time_p99_ms),
    ));

    let statuses: Vec<String> = summary
        .statuses
        .iter()
        .map(|(code, count)| format!("{}: {} reqs", code, count))
        .collect();
    lines.push(format!("HTTP statuses: {}", join_or(&statuses, ", ", NONE)));

    lines.push(format!(
        "Errors: {} failed requests, unique errors={} ({})",
        summary.not_ok_requests_number,
        summary.unique_errors.len(),
        join_or(&summary.unique_errors, ", ", NONE),
    ));

    let slow: Vec<String> = summary
        .long_requests
        .entries()
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| format!("{}: {} requests", name, count))
        .collect();
    lines.push(format!("Slow requests: {}", join_or(&slow, ", ", NONE)));

    lines.push(format!(
        "Found IDs: {}",
        join_or(&summary.sampled_extracted_ids, " | ", NONE)
    ));
    lines.push(format!(
        "Tested URLs: {}",
        join_or(&summary.sampled_urls, ", ", NONE)
    ));
    lines.push(format!(
        "Unique payload sizes: {}",
        if summary.unique_payload_sizes.is_empty() {
            NONE.to_string()
        } else {
            format!("{} bytes", join_or(&summary.unique_payload_sizes, ", ", NONE))
        }
    ));

    lines.join("\n") + "\n"
}
