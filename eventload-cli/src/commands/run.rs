//! Load scenario and re-analysis commands

use anyhow::{Context, Result};
use eventload_config::EventLoadConfig;
use eventload_http::{EndpointRegistry, HttpMetricsClient};
use eventload_runner::{
    load_results, render_report, write_run, Aggregator, Scenario, ScenarioRunner, TestMetadata,
};
use std::path::Path;
use tracing::info;

/// Run `scenario`, write its files and print the report
pub async fn scenario_command(config: &EventLoadConfig, scenario: Scenario) -> Result<()> {
    let registry = EndpointRegistry::from_config(&config.endpoints)
        .context("Invalid endpoint configuration")?;
    let client = HttpMetricsClient::new(config.http.clone().into(), &config.auth.token)
        .context("Failed to create HTTP client")?;

    let report = ScenarioRunner::new(&client, &registry, &config.load_test)
        .run(scenario)
        .await
        .with_context(|| format!("The {} scenario failed", scenario))?;

    let text = render_report(&report.summary);
    let files = write_run(
        &config.load_test.output_dir,
        scenario.name(),
        &report.results,
        &report.summary,
        &text,
    )
    .await
    .context("Failed to write run results")?;

    info!(
        "Summary written to {}, report to {}",
        files.summary.display(),
        files.analytics.display()
    );
    print!("{}", text);
    Ok(())
}

/// Aggregate a results file from an earlier search run and print the report
pub async fn analyze_command(
    config: &EventLoadConfig,
    results_path: &Path,
    testing_time_ms: u64,
) -> Result<()> {
    let results = load_results(results_path)
        .await
        .with_context(|| format!("Failed to load results from {:?}", results_path))?;
    info!("Loaded {} results from {:?}", results.len(), results_path);

    let metadata =
        TestMetadata::for_search(&config.load_test).with_testing_time_ms(testing_time_ms);
    let summary = Aggregator::new(config.load_test.sample_size).aggregate(&results, metadata);

    print!("{}", render_report(&summary));
    Ok(())
}
