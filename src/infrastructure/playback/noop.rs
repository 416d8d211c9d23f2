//! No-op feedback player

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{FeedbackPlayer, PlaybackError};
use crate::domain::feedback::AudioFeedback;

/// Player that discards the reply (used with `--json` and in tests)
pub struct NoOpFeedbackPlayer;

impl NoOpFeedbackPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoOpFeedbackPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedbackPlayer for NoOpFeedbackPlayer {
    async fn play(&self, audio: &AudioFeedback) -> Result<(), PlaybackError> {
        debug!(mime_type = audio.mime_type(), "playback disabled, skipping");
        Ok(())
    }
}
