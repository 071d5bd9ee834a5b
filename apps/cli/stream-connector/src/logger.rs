//! Logging for the stream connector.
//!
//! Coloured stdout for whoever is running the overlay, plus a plain log file
//! that can be attached to bug reports.

use crate::error::ConnectorAppError;

use common::ErrorLocation;

use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

pub const LOG_FILE_NAME: &str = "stream-connector.log";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

#[cfg(debug_assertions)]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the global logger writing to stdout and `{log_dir}/stream-connector.log`.
///
/// Only the first call installs anything; later calls log a warning and
/// return Ok.
///
/// # Arguments
///
/// * `log_dir` - Directory where the log file will be created
/// * `level` - Level from config, `None` for [`DEFAULT_LOG_LEVEL`]
///
/// # Errors
///
/// Returns [`ConnectorAppError::App`] if the log file cannot be created or
/// another logger is already installed.
pub fn initialize(log_dir: &Path, level: Option<LevelFilter>) -> Result<(), ConnectorAppError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let level = level.unwrap_or(DEFAULT_LOG_LEVEL);
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = build_dispatch(log_dir).and_then(apply);
        if result.is_ok() {
            log::set_max_level(level);
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

/// Change the active level after initialization, e.g. once config is loaded.
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
    info!("Log level set to {level:?}");
}

/// Stdout and file dispatch, not yet installed.
///
/// The dispatch passes every level; [`log::set_max_level`] does the filtering
/// so the level can change after installation.
#[track_caller]
pub(crate) fn build_dispatch(log_dir: &Path) -> Result<Dispatch, ConnectorAppError> {
    let log_file_path = log_dir.join(LOG_FILE_NAME);

    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0),
            ))
        })
        .chain(stdout());

    let log_file = fern::log_file(&log_file_path).map_err(|e| ConnectorAppError::App {
        message: format!(
            "Failed to create log file {}: {e}",
            log_file_path.display()
        ),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let file_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{file}:{line}]",
                date = format_rfc3339(SystemTime::now()),
                level = record.level(),
                file = record.file().unwrap_or("unknown"),
                line = record.line().unwrap_or(0)
            ))
        })
        .chain(log_file);

    Ok(Dispatch::new()
        .level(LevelFilter::Trace)
        .chain(stdout_dispatch)
        .chain(file_dispatch))
}

#[track_caller]
fn apply(dispatch: Dispatch) -> Result<(), ConnectorAppError> {
    dispatch.apply().map_err(|e| ConnectorAppError::App {
        message: format!("Failed to initialize logger: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}
