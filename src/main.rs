//! TrimTrack CLI
//!
//! Trim and crop video clips, and detect and track people in them.
//!
//! # Usage
//!
//! ```bash
//! trimtrack inspect -i walk.mp4
//! trimtrack cut -i walk.mp4 --start 00:01:00 --duration 15 --aspect 9:16
//! trimtrack track -i walk.mp4 --tracker kcf --redetect-interval 30
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};

use trimtrack_cli::adapters::TomlConfigAdapter;
use trimtrack_cli::cli::{commands, Cli};
use trimtrack_cli::engine::CancelFlag;
use trimtrack_cli::utils::logging::LoggingSystem;
use trimtrack_cli::{DomainError, TrimTrackError};

#[tokio::main]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            // Same code clap uses for usage errors
            if is_user_error(&e) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (mut config, source) = TomlConfigAdapter::new(cli.config.clone())
        .load()
        .context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid settings")?;

    let logging = LoggingSystem::new(Cli::logging_config(&config));
    logging.initialize()?;
    logging.log_system_info();
    match &source {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => debug!("No config file, using defaults"),
    }
    debug!(command = ?cli.command, "Parsed command line");

    // Long operations poll this between frames
    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current frame");
            on_interrupt.cancel();
        }
    });

    commands::run(cli, config, cancel).await
}

fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<TrimTrackError>()
            .is_some_and(TrimTrackError::is_user_error)
            || cause
                .downcast_ref::<DomainError>()
                .is_some_and(DomainError::is_user_error)
    })
}
