//! CLI command implementations

pub mod config;
pub mod run;

pub use config::{handle_config_generate, handle_config_show, handle_config_validate};
pub use run::{analyze_command, scenario_command};
