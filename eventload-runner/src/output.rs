//! Result files written after a run

use crate::analytics::AggregatedSummary;
use crate::error::{RunnerError, RunnerResult};
use eventload_http::RequestResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of the three files written for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFiles {
    pub results: PathBuf,
    pub summary: PathBuf,
    pub analytics: PathBuf,
}

impl ResultFiles {
    pub fn new(output_dir: &Path, name: &str) -> Self {
        Self {
            results: output_dir.join(format!("{}-results.json", name)),
            summary: output_dir.join(format!("{}-summary.json", name)),
            analytics: output_dir.join(format!("{}-analytics.txt", name)),
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RunnerError + '_ {
    move |source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> RunnerResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await.map_err(io_error(path))
}

/// Write raw results, summary and rendered report under `output_dir`,
/// creating the directory if needed.
pub async fn write_run(
    output_dir: &Path,
    name: &str,
    results: &[RequestResult],
    summary: &AggregatedSummary,
    report: &str,
) -> RunnerResult<ResultFiles> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(io_error(output_dir))?;

    let files = ResultFiles::new(output_dir, name);
    write_json(&files.results, results).await?;
    write_json(&files.summary, summary).await?;
    tokio::fs::write(&files.analytics, report)
        .await
        .map_err(io_error(&files.analytics))?;

    info!(
        "Wrote {} results to {}",
        results.len(),
        files.results.display()
    );
    Ok(files)
}

/// Read back a results file written by [`write_run`]
pub async fn load_results(path: &Path) -> RunnerResult<Vec<RequestResult>> {
    let raw = tokio::fs::read(path).await.map_err(io_error(path))?;
    Ok(serde_json::from_slice(&raw)?)
}
