use common::ErrorLocation;

use thiserror::Error;

/// Errors that end the connector process.
///
/// Core failures are flattened to their message so the binary can report
/// them alongside where the application gave up.
#[derive(Debug, Error)]
pub enum ConnectorAppError {
    /// Error from this App (logger, directories, giving up on reconnects)
    #[error("Connector Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from connector-core (config, connection, session)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}
