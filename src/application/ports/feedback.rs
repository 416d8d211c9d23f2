//! Feedback service port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::feedback::{FeedbackReport, ProcessRecordingRequest};

/// Feedback service errors
#[derive(Debug, Clone, Error)]
pub enum FeedbackError {
    #[error("Feedback request failed: {0}")]
    RequestFailed(String),

    #[error("Feedback service returned HTTP {0}")]
    Status(u16),

    #[error("Failed to parse feedback response: {0}")]
    ParseError(String),
}

/// Port for the remote feedback endpoint
#[async_trait]
pub trait FeedbackService: Send + Sync {
    /// Submit a recording and wait for the report.
    ///
    /// # Arguments
    /// * `request` - Encoded audio plus its format and sample rate
    ///
    /// # Returns
    /// The parsed report, or an error for any non-success outcome
    async fn process_recording(
        &self,
        request: &ProcessRecordingRequest,
    ) -> Result<FeedbackReport, FeedbackError>;
}
