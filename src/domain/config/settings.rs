//! Resolved, read-only settings

use url::Url;

use crate::domain::recording::{AudioConstraints, Duration};

/// Capture and encoder parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSettings {
    pub constraints: AudioConstraints,
    pub mime_type: String,
}

/// Feedback service location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub base_url: Url,
    pub process_recording_path: String,
}

impl ApiSettings {
    /// Full endpoint URL: the base path with the recording path appended
    pub fn url(&self) -> Url {
        let mut url = self.base_url.clone();
        let path = format!(
            "{}{}",
            self.base_url.path().trim_end_matches('/'),
            self.process_recording_path
        );
        url.set_path(&path);
        url
    }
}

/// Settings loaded once at startup and never mutated afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub audio: AudioSettings,
    pub max_duration: Duration,
    pub api: ApiSettings,
    pub play_feedback: bool,
}
