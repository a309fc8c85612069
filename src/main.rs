// pbs-anonymize - Pseudonymization for PBS workload manager data
// Copyright (c) 2025 pbs-anonymize Contributors
// Licensed under the MIT License

use clap::Parser;
use pbs_anonymize::cli::{Cli, Commands};
use pbs_anonymize::config::{load_config_or_default, LoggingConfig};
use pbs_anonymize::logging::init_logging;
use std::process;

fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Configuration problems are reported by the command itself
    let (file_level, logging_config) = match load_config_or_default(&cli.config) {
        Ok(config) => (config.application.log_level, config.logging),
        Err(_) => ("info".to_string(), LoggingConfig::default()),
    };
    let log_level = cli.log_level.as_deref().unwrap_or(&file_level);

    let guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "pbs-anonymize starting");

    let exit_code = match execute_command(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5 // Fatal error exit code
        }
    };

    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Anonymize(args) => args.execute(&cli.config),
        Commands::ValidateConfig(args) => args.execute(&cli.config),
        Commands::Init(args) => args.execute(),
    }
}
