//! Feedback playback adapters

mod noop;
mod rodio;

pub use noop::NoOpFeedbackPlayer;
pub use self::rodio::RodioFeedbackPlayer;

use crate::application::ports::FeedbackPlayer;

/// Create a player based on whether audio output is wanted
pub fn create_player(enabled: bool) -> Box<dyn FeedbackPlayer> {
    if enabled {
        Box::new(RodioFeedbackPlayer::new())
    } else {
        Box::new(NoOpFeedbackPlayer::new())
    }
}
