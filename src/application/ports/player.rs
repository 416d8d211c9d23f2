//! Feedback playback port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::feedback::AudioFeedback;

/// Errors that can occur during feedback playback
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The payload is not valid base64 or not a playable container
    #[error("Failed to decode audio feedback: {0}")]
    Decode(String),

    /// No audio output device available
    #[error("Audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Failed to play the audio
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}

/// Port trait for playing the spoken feedback reply
#[async_trait]
pub trait FeedbackPlayer: Send + Sync {
    /// Decode and play the reply, returning when playback ends
    async fn play(&self, audio: &AudioFeedback) -> Result<(), PlaybackError>;
}

/// Blanket implementation for boxed player types
#[async_trait]
impl FeedbackPlayer for Box<dyn FeedbackPlayer> {
    async fn play(&self, audio: &AudioFeedback) -> Result<(), PlaybackError> {
        self.as_ref().play(audio).await
    }
}
