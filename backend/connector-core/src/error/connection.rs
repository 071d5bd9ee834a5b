use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Transport failures. Each one ends the current session; the core never
/// retries on its own.
#[derive(Debug, ThisError)]
pub enum ConnectionError {
    #[error("Invalid Endpoint Error: {message} {location}")]
    InvalidEndpoint {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },
}
