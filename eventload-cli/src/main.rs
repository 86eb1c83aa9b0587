use anyhow::{Context, Result};
use clap::Parser;
use eventload_config::domains::logging::LogFormat;
use eventload_config::{ConfigLoader, EventLoadConfig, LoggingConfig};
use eventload_runner::Scenario;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, ConfigCommands};

/// Load configuration from an explicit file, or from the environment over defaults.
///
/// Runs before tracing is set up, so failures surface through the returned error.
fn load_config(config_path: Option<&Path>) -> Result<EventLoadConfig> {
    let context = match config_path {
        Some(path) => format!("Failed to load configuration from {:?}", path),
        None => "Failed to load configuration from environment".to_string(),
    };
    ConfigLoader::new().load(config_path).context(context)
}

/// `--log-level` wins, then `RUST_LOG`, then the configured level
fn build_env_filter(log_level: Option<&str>, logging: &LoggingConfig) -> EnvFilter {
    match log_level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level '{}', falling back to 'info'", level);
            EnvFilter::new("info")
        }),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str())),
    }
}

/// Initialize tracing on stderr; stdout is reserved for reports
fn init_tracing(log_level: Option<&str>, logging: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(log_level, logging);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let initialized = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    initialized.map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    debug!("Tracing initialized");
    Ok(())
}

fn scenario_for(command: &Commands) -> Option<Scenario> {
    match command {
        Commands::SearchEvents => Some(Scenario::SearchEvents),
        Commands::ReturnEvents => Some(Scenario::ReturnEvents),
        Commands::ReturnObservations => Some(Scenario::ReturnObservations),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match &cli.command {
        Some(command) => command,
        None => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            println!();
            return Ok(());
        }
    };

    // Config subcommands work on files directly and must not fail on a bad global config
    if let Commands::Config { config_cmd } = command {
        init_tracing(cli.log_level.as_deref(), &LoggingConfig::default())?;
        return match config_cmd {
            ConfigCommands::Validate { config_file } => {
                commands::handle_config_validate(config_file)
            }
            ConfigCommands::Generate { output, force } => {
                commands::handle_config_generate(output, *force)
            }
            ConfigCommands::Show { format } => {
                let config = load_config(cli.config.as_deref())?;
                commands::handle_config_show(&config, format)
            }
        };
    }

    let mut config = load_config(cli.config.as_deref())?;
    init_tracing(cli.log_level.as_deref(), &config.logging)?;
    match &cli.config {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => debug!("No configuration file given, using environment and defaults"),
    }
    if let Some(output_dir) = &cli.output_dir {
        config.load_test.output_dir = output_dir.clone();
    }

    if let Some(scenario) = scenario_for(command) {
        return commands::scenario_command(&config, scenario).await;
    }

    match command {
        Commands::Analyze {
            results,
            testing_time_ms,
        } => commands::analyze_command(&config, results, *testing_time_ms).await,
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_commands_map_to_scenarios() {
        assert_eq!(
            scenario_for(&Commands::SearchEvents),
            Some(Scenario::SearchEvents)
        );
        assert_eq!(
            scenario_for(&Commands::ReturnObservations),
            Some(Scenario::ReturnObservations)
        );
        let analyze = Commands::Analyze {
            results: "r.json".into(),
            testing_time_ms: 0,
        };
        assert_eq!(scenario_for(&analyze), None);
    }

    fn ambient_eventload_vars() -> Vec<String> {
        std::env::vars()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with("EVENTLOAD_"))
            .collect()
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/eventload.yaml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/eventload.yaml"));
    }

    #[test]
    fn test_no_config_file_uses_defaults() {
        temp_env::with_vars_unset(ambient_eventload_vars(), || {
            let config = load_config(None).unwrap();
            assert_eq!(config.load_test.requests_per_batch, 10);
            assert_eq!(config.load_test.number_of_requests, 80);
        });
    }

    #[test]
    fn test_existing_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eventload.yaml");
        std::fs::write(&path, "load_test:\n  requests_per_batch: 4\n").unwrap();

        temp_env::with_vars_unset(ambient_eventload_vars(), || {
            let config = load_config(Some(path.as_path())).unwrap();
            assert_eq!(config.load_test.requests_per_batch, 4);
        });
    }
}
