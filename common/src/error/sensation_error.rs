use crate::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SensationError {
    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}
