//! User-visible workflow errors

use thiserror::Error;

use super::state::InvalidStateTransition;

/// Message shown when the microphone cannot be opened
pub const MICROPHONE_ACCESS_MESSAGE: &str = "Failed to access microphone";

/// Message shown for any encode or submission failure
pub const PROCESSING_MESSAGE: &str = "Failed to process recording";

/// Outcome errors of the recording workflow.
///
/// Causes are logged where they occur; only these messages reach the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Failed to access microphone")]
    MicrophoneAccess,

    #[error("Failed to process recording")]
    Processing,

    /// The request was refused; the error slot is left untouched
    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),
}

impl WorkflowError {
    /// True for failures that end a session and occupy the error slot
    pub fn is_outcome(&self) -> bool {
        !matches!(self, Self::InvalidState(_))
    }
}
