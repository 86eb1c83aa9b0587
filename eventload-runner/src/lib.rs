//! Load-test execution for eventload
//!
//! Requests built by `eventload-http` are executed here in fixed-size
//! concurrent batches with a pause between batches, and the per-request
//! results are reduced into an [`AggregatedSummary`] that can be rendered as
//! a text report or written to disk.

pub mod analytics;
pub mod batch;
pub mod error;
pub mod output;
pub mod report;
pub mod scenario;

pub use analytics::{
    aggregate, AggregatedSummary, Aggregator, SlowRequestBuckets, TestMetadata,
    DEFAULT_SAMPLE_SIZE, SLOW_THRESHOLDS_MS,
};
pub use batch::{run_in_batches, BatchRunConfiguration, BatchRunOutput};
pub use error::{RunnerError, RunnerResult};
pub use output::{load_results, write_run, ResultFiles};
pub use report::render_report;
pub use scenario::{
    extract_event_ids, extract_returned_event_id, Discovery, Scenario, ScenarioReport,
    ScenarioRunner,
};
