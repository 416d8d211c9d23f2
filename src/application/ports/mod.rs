//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod config;
pub mod encoder;
pub mod feedback;
pub mod microphone;
pub mod player;

// Re-export common types
pub use config::ConfigStore;
pub use encoder::{
    ChunkEncoder, EncoderError, EncoderEvent, EncoderHandle, EncoderOptions, DEFAULT_TIMESLICE,
};
pub use feedback::{FeedbackError, FeedbackService};
pub use microphone::{MediaStream, MediaTrack, MicrophoneError, MicrophoneSource, PcmReceiver};
pub use player::{FeedbackPlayer, PlaybackError};
