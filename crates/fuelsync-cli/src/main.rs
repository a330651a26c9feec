//! fuelsync - copy Fuelio fuel fillups into Lubelogger
//!
//! Reads each paired vehicle's Fuelio backup, compares it with the
//! vehicle's Lubelogger fuel log and adds whatever is missing.

mod cli;
mod commands;
mod error;
mod logging;


use std::env;

use clap::Parser;
use fuelsync_core::config::SyncConfig;
use fuelsync_core::sync::SyncOptions;

use crate::cli::{Cli, Commands};
use crate::commands::config::run_check_config;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Sync);

    let config = SyncConfig::load(&cli.config_dir)?;
    logging::init(&logging::resolve_filter(
        cli.log_level,
        env::var("RUST_LOG").ok(),
        config.log_level_name().as_deref(),
    ));
    tracing::debug!("Loaded {config:?}");

    match command {
        Commands::CheckConfig => run_check_config(&config),
        Commands::Sync => {
            let options = SyncOptions {
                dry_run: cli.dry_run,
                only_fuelio_id: cli.vehicle,
            };
            run_sync(&config, options).await
        }
    }
}
