//! Application layer - Use cases and port interfaces
//!
//! Contains the recording workflow and the trait definitions
//! for external system interactions.

pub mod playback;
pub mod ports;
pub mod processing;
pub mod workflow;

// Re-export use cases
pub use playback::PlayFeedbackUseCase;
pub use processing::{ProcessingFlag, ProcessingGuard};
pub use workflow::{RecordingWorkflow, StopReason, WorkflowEvent};
