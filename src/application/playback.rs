//! Feedback playback use case

use tracing::{debug, info};

use crate::domain::feedback::FeedbackReport;

use super::ports::{FeedbackPlayer, PlaybackError};

/// Plays the spoken part of a report, if it has one
pub struct PlayFeedbackUseCase<P: FeedbackPlayer> {
    player: P,
}

impl<P: FeedbackPlayer> PlayFeedbackUseCase<P> {
    pub fn new(player: P) -> Self {
        Self { player }
    }

    /// Play the report's audio until it finishes.
    ///
    /// # Returns
    /// `Ok(false)` if the report carries no audio
    pub async fn execute(&self, report: &FeedbackReport) -> Result<bool, PlaybackError> {
        let Some(audio) = report.audio_feedback.as_ref() else {
            debug!("report has no audio feedback");
            return Ok(false);
        };

        info!(mime_type = audio.mime_type(), "playing audio feedback");
        self.player.play(audio).await?;
        Ok(true)
    }
}
