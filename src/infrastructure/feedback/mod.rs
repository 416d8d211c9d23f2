//! Feedback service adapters

mod http;

pub use http::HttpFeedbackService;
