//! Ferry CLI Binary
//!
//! Command-line interface for mirroring code between a local directory and the server.

use clap::Parser;
use ferry::cli::{command_name, Cli, RunContext};
use ferry::config::ConfigLoader;
use ferry::logging::{init_logging, LoggingConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();
    let project_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli, &project_dir);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!(command = command_name(&cli.command), "Ferry CLI starting");

    let context = match RunContext::new(project_dir, cli.config.clone(), cli.server.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", ferry::cli::map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", ferry::cli::map_error(&e));
            process::exit(1);
        }
    }
}

/// Build logging configuration from CLI args and the config files.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, project_dir: &std::path::Path) -> LoggingConfig {
    let mut config = ConfigLoader::load(project_dir, cli.config.as_deref())
        .ok()
        .map(|c| c.logging)
        .unwrap_or_default();

    if cli.command.is_quiet() {
        config.enabled = false;
    }
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
        config.file = Some(file.clone());
    }

    config
}
