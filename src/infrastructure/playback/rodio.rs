//! Rodio-based feedback player
//!
//! Decodes the spoken reply (mp3, wav, ogg...) and plays it to the default
//! output device.

use std::io::Cursor;

use async_trait::async_trait;
use rodio::{Decoder, OutputStream, Sink};

use crate::application::ports::{FeedbackPlayer, PlaybackError};
use crate::domain::feedback::AudioFeedback;

/// Feedback player implementation using rodio
pub struct RodioFeedbackPlayer;

impl RodioFeedbackPlayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RodioFeedbackPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedbackPlayer for RodioFeedbackPlayer {
    async fn play(&self, audio: &AudioFeedback) -> Result<(), PlaybackError> {
        let bytes = audio
            .decode()
            .map_err(|e| PlaybackError::Decode(e.to_string()))?;

        // Run audio playback in blocking thread to avoid blocking the async runtime
        tokio::task::spawn_blocking(move || play_sync(bytes))
            .await
            .map_err(|e| PlaybackError::PlaybackFailed(format!("Task join error: {}", e)))?
    }
}

/// Play decoded bytes until the end (called from spawn_blocking)
fn play_sync(bytes: Vec<u8>) -> Result<(), PlaybackError> {
    let source = Decoder::new(Cursor::new(bytes)).map_err(|e| PlaybackError::Decode(e.to_string()))?;

    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| PlaybackError::DeviceNotAvailable(e.to_string()))?;

    let sink =
        Sink::try_new(&stream_handle).map_err(|e| PlaybackError::PlaybackFailed(e.to_string()))?;

    sink.append(source);
    sink.sleep_until_end();

    Ok(())
}
