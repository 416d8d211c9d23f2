//! Feedback report value objects

use base64::Engine;
use serde::{Deserialize, Serialize};

/// MIME type assumed when the reply carries bare base64
const DEFAULT_FEEDBACK_MIME: &str = "audio/mpeg";

/// Synthesized spoken reply, base64-encoded.
///
/// The service may send either bare base64 or a full
/// `data:<mime>;base64,<payload>` URI; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioFeedback(String);

impl AudioFeedback {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The value exactly as received
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type from the data URI, or the mp3 default
    pub fn mime_type(&self) -> &str {
        self.split_data_uri()
            .map(|(mime, _)| mime)
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_FEEDBACK_MIME)
    }

    /// Decode the base64 payload into playable bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let encoded = self
            .split_data_uri()
            .map(|(_, data)| data)
            .unwrap_or(self.0.as_str());
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD.decode(compact)
    }

    fn split_data_uri(&self) -> Option<(&str, &str)> {
        let rest = self.0.trim().strip_prefix("data:")?;
        let (meta, data) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64").unwrap_or(meta);
        Some((mime, data))
    }
}

/// Structured result of a successful submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    /// Confidence score, 0 to 100
    pub confidence: f64,
    /// Pronunciation areas to improve, in the order given
    #[serde(default)]
    pub pronunciation_mistakes: Vec<String>,
    /// Overall commentary on the delivery
    pub overall_feedback: String,
    /// Optional spoken reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_feedback: Option<AudioFeedback>,
}

impl FeedbackReport {
    /// Confidence clamped into `[0, 100]` for display
    pub fn clamped_confidence(&self) -> f64 {
        if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 100.0)
        }
    }

    /// Confidence with one decimal, e.g. `87.5%`
    pub fn confidence_label(&self) -> String {
        format!("{:.1}%", self.confidence)
    }

    pub fn has_audio_feedback(&self) -> bool {
        self.audio_feedback.is_some()
    }
}
