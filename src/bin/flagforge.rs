//! FlagForge CLI Binary
//!
//! Command-line interface for the FlagForge manifest preprocessing tool.

use clap::Parser;
use flagforge::cli::{Cli, RunContext};
use flagforge::logging::{init_logging, LoggingConfig};
use flagforge::settings::{self, Settings};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and the settings file
    let logging_config = build_logging_config(&cli);

    // Initialize logging early
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("FlagForge CLI starting");

    let mut context = match RunContext::new(cli.settings.clone(), cli.offline) {
        Ok(ctx) => {
            info!("CLI context initialized");
            ctx
        }
        Err(e) => {
            error!("Error loading settings: {}", e);
            eprintln!("{}", flagforge::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command).await {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", flagforge::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and the settings file.
/// Precedence: CLI flags override the settings file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(settings::default_settings_path);
    let mut config = Settings::load(&settings_path)
        .map(|s| s.logging)
        .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = file.clone();
    }

    config
}
