//! Domain layer - Core business logic
//!
//! Contains value objects, entities, the workflow state machine, and errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod feedback;
pub mod recording;
pub mod workflow;

// Re-export common types
pub use config::{AppConfig, Settings};
pub use error::*;
pub use feedback::{AudioFeedback, FeedbackReport, ProcessRecordingRequest};
pub use recording::{AudioConstraints, AudioFormat, AudioPayload, Duration, Session};
pub use workflow::{InvalidStateTransition, WorkflowError, WorkflowState};
