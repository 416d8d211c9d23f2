//! Recording domain module

mod audio_payload;
mod constraints;
mod duration;
mod session;

pub use audio_payload::{AudioFormat, AudioPayload};
pub use constraints::AudioConstraints;
pub use duration::{format_clock, Duration, DEFAULT_MAX_DURATION_SECS};
pub use session::{Session, TickOutcome};
