use crate::session::SessionPhase;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("Invalid Transition Error: cannot {action} while {phase:?} {location}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
        location: ErrorLocation,
    },

    #[error("Ids Exhausted Error: no message ids left on this connection {location}")]
    IdsExhausted { location: ErrorLocation },
}
