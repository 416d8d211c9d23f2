//! Recording infrastructure module
//!
//! Microphone capture via cpal and incremental WebM/Opus encoding.

mod cpal_microphone;
mod webm;
mod webm_opus_encoder;

pub use cpal_microphone::CpalMicrophone;
pub use webm::WebmMuxer;
pub use webm_opus_encoder::{is_supported_mime_type, WebmOpusEncoder, OPUS_SAMPLE_RATES};
