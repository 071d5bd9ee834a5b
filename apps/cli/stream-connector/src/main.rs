use stream_connector::error::ConnectorAppError;
use stream_connector::logger::{initialize as LoggerInitialize, set_level as set_log_level};
use stream_connector::supervisor::run_until;

use connector_core::config::ConnectorConfig;

use common::ErrorLocation;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info, warn};
use tokio::sync::watch;

const APP_DIR_NAME: &str = "stream-connector";

#[tokio::main]
async fn main() -> ExitCode {
    match start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn start() -> Result<(), ConnectorAppError> {
    // Must run before config so `.env` values reach the overrides
    let dotenv = dotenvy::dotenv();

    let log_dir = log_dir()?;
    create_dir_all(&log_dir).map_err(|e| ConnectorAppError::App {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST, at the build default until config is read
    LoggerInitialize(&log_dir, None)?;

    info!("Stream connector starting");
    info!("Log directory: {}", log_dir.display());
    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env: {e}"),
    }

    let config_dir = ConnectorConfig::default_dir().map_err(core_error)?;
    info!("Config directory: {}", config_dir.display());
    let mut config = ConnectorConfig::load(&config_dir).map_err(core_error)?;
    config.apply_env_overrides().map_err(core_error)?;
    config.validate().map_err(core_error)?;

    if let Some(level) = config.log_level().map_err(core_error)? {
        set_log_level(level);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    run_until(&config, shutdown_rx).await
}

fn log_dir() -> Result<PathBuf, ConnectorAppError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join("logs"))
        .ok_or_else(|| ConnectorAppError::App {
            message: "No local data directory on this platform".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}

#[track_caller]
fn core_error(error: impl std::fmt::Display) -> ConnectorAppError {
    ConnectorAppError::Core {
        message: error.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
