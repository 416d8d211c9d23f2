//! Workflow domain module

mod error;
mod state;

pub use error::{WorkflowError, MICROPHONE_ACCESS_MESSAGE, PROCESSING_MESSAGE};
pub use state::{InvalidStateTransition, WorkflowState, WorkflowStateMachine};
