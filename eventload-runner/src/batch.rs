//! Paced batch scheduler
//!
//! Tasks are split into consecutive batches of a fixed size. All tasks of a
//! batch run concurrently, the scheduler waits for every one of them, then
//! pauses before starting the next batch. Tasks past the last full batch are
//! never started.

use crate::error::{RunnerError, RunnerResult};
use chrono::{SecondsFormat, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Shape of one load run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRunConfiguration {
    total_requests: usize,
    requests_per_batch: usize,
    pause_between_batches: Duration,
}

impl BatchRunConfiguration {
    pub fn new(
        total_requests: usize,
        requests_per_batch: usize,
        pause_between_batches: Duration,
    ) -> RunnerResult<Self> {
        if requests_per_batch == 0 {
            return Err(RunnerError::InvalidBatchConfig(
                "requests per batch must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            total_requests,
            requests_per_batch,
            pause_between_batches,
        })
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    pub fn requests_per_batch(&self) -> usize {
        self.requests_per_batch
    }

    pub fn pause_between_batches(&self) -> Duration {
        self.pause_between_batches
    }

    /// Full batches only
    pub fn number_of_batches(&self) -> usize {
        self.total_requests / self.requests_per_batch
    }

    pub fn executed_requests(&self) -> usize {
        self.number_of_batches() * self.requests_per_batch
    }

    /// Requests that do not fill a final batch and will not run
    pub fn skipped_requests(&self) -> usize {
        self.total_requests - self.executed_requests()
    }
}

/// Results in submission order plus the wall-clock time of the whole run
#[derive(Debug, Clone)]
pub struct BatchRunOutput<T> {
    pub results: Vec<T>,
    pub elapsed: Duration,
}

impl<T> BatchRunOutput<T> {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

/// Run `tasks` in batches of `batch_size`, sleeping `pause` between batches.
///
/// Each task is only invoked when its batch starts. The returned results
/// keep submission order within a batch and batch order across the run.
pub async fn run_in_batches<T, F, Fut>(
    tasks: Vec<F>,
    batch_size: usize,
    pause: Duration,
) -> RunnerResult<BatchRunOutput<T>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let config = BatchRunConfiguration::new(tasks.len(), batch_size, pause)?;
    let number_of_batches = config.number_of_batches();

    let span = info_span!(
        "batch_run",
        tasks = tasks.len(),
        batch_size,
        batches = number_of_batches
    );

    async move {
        if config.skipped_requests() > 0 {
            warn!(
                "{} requests do not fill a final batch of {} and will not run",
                config.skipped_requests(),
                batch_size
            );
        }

        let started = Instant::now();
        info!(
            "Start requesting: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        );

        let mut results = Vec::with_capacity(config.executed_requests());
        let mut pending = tasks.into_iter();
        for index in 0..number_of_batches {
            info!(
                "Running batch {} of {} ({} left)",
                index + 1,
                number_of_batches,
                number_of_batches - index - 1
            );
            let batch = pending.by_ref().take(batch_size).map(|task| task());
            results.extend(join_all(batch).await);

            if index + 1 < number_of_batches && !pause.is_zero() {
                debug!("Sleeping {}ms", pause.as_millis());
                tokio::time::sleep(pause).await;
            }
        }

        let elapsed = started.elapsed();
        info!(
            "End requesting: {} ({}ms)",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            elapsed.as_millis()
        );

        Ok(BatchRunOutput { results, elapsed })
    }
    .instrument(span)
    .await
}
