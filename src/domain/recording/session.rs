//! Recording session entity

use super::audio_payload::{AudioFormat, AudioPayload};
use super::duration::Duration;

/// Result of advancing the session clock by one second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still under the limit; carries the new elapsed seconds
    Running(u64),
    /// The limit was reached on this tick; the session must stop now
    LimitReached(u64),
    /// The session is no longer recording; the tick was ignored
    Ignored,
}

/// One start-to-finish recording attempt and its accumulated audio.
///
/// Chunks are append-only while the session lives. `drain` consumes the
/// session, so nothing can be appended once finalization has begun.
#[derive(Debug)]
pub struct Session {
    is_recording: bool,
    elapsed_seconds: u64,
    max_seconds: u64,
    chunks: Vec<Vec<u8>>,
    captured_bytes: usize,
}

impl Session {
    /// Begin a new session with the given maximum length
    pub fn start(max_duration: Duration) -> Self {
        Self {
            is_recording: true,
            elapsed_seconds: 0,
            max_seconds: max_duration.as_secs(),
            chunks: Vec::new(),
            captured_bytes: 0,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn max_seconds(&self) -> u64 {
        self.max_seconds
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn captured_bytes(&self) -> usize {
        self.captured_bytes
    }

    /// Append an encoder chunk. Zero-length chunks are discarded and
    /// reported as `false`.
    pub fn append_chunk(&mut self, chunk: Vec<u8>) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.captured_bytes += chunk.len();
        self.chunks.push(chunk);
        true
    }

    /// Advance the clock by one second.
    ///
    /// The elapsed counter never passes the limit: the tick that reaches it
    /// returns `LimitReached` and marks the session as no longer recording.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_recording {
            return TickOutcome::Ignored;
        }

        self.elapsed_seconds += 1;
        if self.elapsed_seconds >= self.max_seconds {
            self.elapsed_seconds = self.max_seconds;
            self.is_recording = false;
            TickOutcome::LimitReached(self.elapsed_seconds)
        } else {
            TickOutcome::Running(self.elapsed_seconds)
        }
    }

    /// Stop counting time. Chunks flushed by the encoder after this point
    /// are still accepted until the session is drained.
    pub fn mark_stopped(&mut self) {
        self.is_recording = false;
    }

    /// Consume the session and concatenate its chunks in arrival order
    pub fn drain(self, format: AudioFormat) -> AudioPayload {
        AudioPayload::concat(self.chunks, format)
    }
}
