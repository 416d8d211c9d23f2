//! Recording workflow state machine

use std::fmt;
use thiserror::Error;

/// Workflow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Recording,
    Finalizing,
    Submitting,
    Done,
    Failed,
}

impl WorkflowState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Finalizing => "finalizing",
            Self::Submitting => "submitting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// True while a stopped recording is being encoded or submitted
    pub const fn is_processing(&self) -> bool {
        matches!(self, Self::Finalizing | Self::Submitting)
    }

    /// True when a new recording may begin
    pub const fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Failed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while in {current_state} state")]
pub struct InvalidStateTransition {
    pub current_state: WorkflowState,
    pub action: String,
}

/// Tracks the workflow lifecycle and rejects out-of-order transitions.
///
/// State machine:
///   IDLE | DONE | FAILED -> RECORDING   (begin_recording)
///   IDLE | DONE | FAILED -> FAILED      (fail_to_start)
///   RECORDING -> FINALIZING             (begin_finalizing)
///   FINALIZING -> SUBMITTING            (begin_submitting)
///   SUBMITTING -> DONE                  (complete)
///   FINALIZING | SUBMITTING -> FAILED   (fail_processing)
///   any -> IDLE                         (reset)
#[derive(Debug, Default)]
pub struct WorkflowStateMachine {
    state: WorkflowState,
}

impl WorkflowStateMachine {
    /// Create a new state machine in idle state
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
        }
    }

    /// Get the current state
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == WorkflowState::Recording
    }

    pub fn is_processing(&self) -> bool {
        self.state.is_processing()
    }

    fn transition(
        &mut self,
        allowed: bool,
        next: WorkflowState,
        action: &str,
    ) -> Result<(), InvalidStateTransition> {
        if !allowed {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: action.to_string(),
            });
        }
        self.state = next;
        Ok(())
    }

    /// Check whether a recording may start, without transitioning
    pub fn ensure_can_start(&self) -> Result<(), InvalidStateTransition> {
        if self.state.can_start() {
            Ok(())
        } else {
            Err(InvalidStateTransition {
                current_state: self.state,
                action: "start recording".to_string(),
            })
        }
    }

    pub fn begin_recording(&mut self) -> Result<(), InvalidStateTransition> {
        let allowed = self.state.can_start();
        self.transition(allowed, WorkflowState::Recording, "start recording")
    }

    pub fn fail_to_start(&mut self) -> Result<(), InvalidStateTransition> {
        let allowed = self.state.can_start();
        self.transition(allowed, WorkflowState::Failed, "fail to start")
    }

    pub fn begin_finalizing(&mut self) -> Result<(), InvalidStateTransition> {
        let allowed = self.state == WorkflowState::Recording;
        self.transition(allowed, WorkflowState::Finalizing, "stop recording")
    }

    pub fn begin_submitting(&mut self) -> Result<(), InvalidStateTransition> {
        let allowed = self.state == WorkflowState::Finalizing;
        self.transition(allowed, WorkflowState::Submitting, "submit recording")
    }

    pub fn complete(&mut self) -> Result<(), InvalidStateTransition> {
        let allowed = self.state == WorkflowState::Submitting;
        self.transition(allowed, WorkflowState::Done, "complete submission")
    }

    pub fn fail_processing(&mut self) -> Result<(), InvalidStateTransition> {
        let allowed = self.state.is_processing();
        self.transition(allowed, WorkflowState::Failed, "fail processing")
    }

    /// Return to idle unconditionally (teardown)
    pub fn reset(&mut self) {
        self.state = WorkflowState::Idle;
    }
}
