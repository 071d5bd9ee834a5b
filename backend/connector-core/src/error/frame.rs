use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Per-frame decode failures. The offending frame is dropped and the
/// receive loop keeps running.
#[derive(Debug, ThisError)]
pub enum FrameError {
    #[error("Malformed Frame Error: {message} {location}")]
    MalformedFrame {
        message: String,
        location: ErrorLocation,
    },

    #[error("Protocol Violation Error: {message} {location}")]
    ProtocolViolation {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },
}
