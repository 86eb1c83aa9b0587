//! Configuration management commands

use anyhow::{Context, Result};
use eventload_config::{ConfigLoader, EventLoadConfig};
use serde_json::Value as JsonValue;
use std::fs;
use std::path::Path;
use tracing::{error, info};

const REDACTED: &str = "***";

/// Handle configuration validation
pub fn handle_config_validate(config_file: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match ConfigLoader::new().from_file(config_file) {
        Ok(_) => {
            println!("Configuration file is valid");
            Ok(())
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            Err(e).context(format!("Invalid configuration in {:?}", config_file))
        }
    }
}

/// Write the default configuration as YAML to `output`
pub fn handle_config_generate(output: &Path, force: bool) -> Result<()> {
    info!("Generating configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, EventLoadConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("Configuration generated at: {:?}", output);
    println!(
        "Validate with: eventload config validate --config-file {:?}",
        output
    );
    Ok(())
}

/// Print the effective configuration with the token redacted
pub fn handle_config_show(config: &EventLoadConfig, format: &str) -> Result<()> {
    let mut value = serde_json::to_value(config).context("Failed to serialize config")?;
    redact_token(&mut value);

    let rendered = match format.to_lowercase().as_str() {
        "yaml" | "yml" => serde_yaml::to_string(&value).context("Failed to serialize to YAML")?,
        "json" => serde_json::to_string_pretty(&value).context("Failed to serialize to JSON")?,
        other => {
            return Err(anyhow::anyhow!(
                "Unknown format: {}. Valid formats: yaml, json",
                other
            ))
        }
    };
    println!("{}", rendered);
    Ok(())
}

fn redact_token(value: &mut JsonValue) {
    if let Some(token) = value.pointer_mut("/auth/token") {
        if token.as_str().is_some_and(|t| !t.is_empty()) {
            *token = JsonValue::String(REDACTED.to_string());
        }
    }
}
