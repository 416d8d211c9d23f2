//! HTTP feedback service adapter

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::ports::{FeedbackError, FeedbackService};
use crate::domain::config::ApiSettings;
use crate::domain::feedback::{FeedbackReport, ProcessRecordingRequest};

/// Upper bound for one submission, upload and analysis included
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(300);

/// Feedback service reached over HTTPS with a JSON body
pub struct HttpFeedbackService {
    url: String,
    client: reqwest::Client,
}

impl HttpFeedbackService {
    /// Create a client for the configured endpoint
    pub fn new(api: &ApiSettings) -> Self {
        Self::with_url(api.url())
    }

    /// Create a client for an explicit endpoint URL
    pub fn with_url(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeedbackService for HttpFeedbackService {
    async fn process_recording(
        &self,
        request: &ProcessRecordingRequest,
    ) -> Result<FeedbackReport, FeedbackError> {
        debug!(url = %self.url, bytes = request.audio_data.len(), "posting recording");

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| FeedbackError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedbackError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedbackError::RequestFailed(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| FeedbackError::ParseError(e.to_string()))
    }
}
