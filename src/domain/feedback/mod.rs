//! Feedback domain module

mod report;
mod request;

pub use report::{AudioFeedback, FeedbackReport};
pub use request::ProcessRecordingRequest;
