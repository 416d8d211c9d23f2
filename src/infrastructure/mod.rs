//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio hardware, the feedback endpoint and the
//! config file.

pub mod config;
pub mod feedback;
pub mod playback;
pub mod recording;

// Re-export adapters
pub use config::XdgConfigStore;
pub use feedback::HttpFeedbackService;
pub use playback::{create_player, NoOpFeedbackPlayer, RodioFeedbackPlayer};
pub use recording::{CpalMicrophone, WebmOpusEncoder};
