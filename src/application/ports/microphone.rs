//! Microphone source port

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::recording::AudioConstraints;

/// Microphone errors
#[derive(Debug, Clone, Error)]
pub enum MicrophoneError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    #[error("Requested audio constraints are not supported: {0}")]
    Unsupported(String),

    #[error("Failed to open microphone: {0}")]
    OpenFailed(String),
}

/// Interleaved i16 PCM frames at the stream's sample rate
pub type PcmReceiver = mpsc::UnboundedReceiver<Vec<i16>>;

/// One capture track of a media stream
pub trait MediaTrack: Send {
    /// Device label
    fn label(&self) -> &str;

    /// True until the track has been stopped
    fn is_live(&self) -> bool;

    /// Stop capturing and release the device. Must be idempotent.
    fn stop(&mut self);
}

/// An open microphone stream.
///
/// Owns its tracks; every track is stopped when the stream is dropped, so
/// the device cannot stay open past the stream's owner.
pub struct MediaStream {
    sample_rate: u32,
    channel_count: u16,
    tracks: Vec<Box<dyn MediaTrack>>,
    pcm: Option<PcmReceiver>,
}

impl MediaStream {
    /// Create a stream from its tracks and PCM feed
    pub fn new(
        sample_rate: u32,
        channel_count: u16,
        tracks: Vec<Box<dyn MediaTrack>>,
        pcm: PcmReceiver,
    ) -> Self {
        Self {
            sample_rate,
            channel_count,
            tracks,
            pcm: Some(pcm),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    /// Enumerate the stream's tracks
    pub fn tracks(&self) -> &[Box<dyn MediaTrack>] {
        &self.tracks
    }

    /// Number of tracks still capturing
    pub fn live_track_count(&self) -> usize {
        self.tracks.iter().filter(|t| t.is_live()).count()
    }

    /// Hand the PCM feed to a consumer. Only the first call gets it.
    pub fn take_pcm(&mut self) -> Option<PcmReceiver> {
        self.pcm.take()
    }

    /// Stop every track
    pub fn stop_all_tracks(&mut self) {
        for track in &mut self.tracks {
            if track.is_live() {
                debug!(device = track.label(), "stopping track");
                track.stop();
            }
        }
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop_all_tracks();
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("sample_rate", &self.sample_rate)
            .field("channel_count", &self.channel_count)
            .field("tracks", &self.tracks.len())
            .field("live", &self.live_track_count())
            .finish()
    }
}

/// Port for microphone acquisition
#[async_trait]
pub trait MicrophoneSource: Send + Sync {
    /// Open a stream honoring the given constraints.
    ///
    /// # Returns
    /// The open stream, or an error if the device is missing or refused
    async fn open(&self, constraints: &AudioConstraints) -> Result<MediaStream, MicrophoneError>;
}
