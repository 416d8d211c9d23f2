//! Chunk encoder port

use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::mpsc;

use super::microphone::MediaStream;

/// Flush interval used by the recorder (one chunk per second)
pub const DEFAULT_TIMESLICE: StdDuration = StdDuration::from_secs(1);

/// Encoder errors
#[derive(Debug, Clone, Error)]
pub enum EncoderError {
    #[error("Unsupported encoder MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("Stream has no PCM feed to encode")]
    StreamUnavailable,

    #[error("Failed to initialize encoder: {0}")]
    InitFailed(String),

    #[error("Encoding failed: {0}")]
    EncodeFailed(String),
}

/// Encoder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Output MIME type, e.g. `audio/webm;codecs=opus`
    pub mime_type: String,
    /// How often buffered output is flushed as a chunk
    pub timeslice: StdDuration,
}

impl EncoderOptions {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            timeslice: DEFAULT_TIMESLICE,
        }
    }
}

/// Events emitted by a running encoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// One flush worth of encoded bytes (may be empty)
    DataAvailable(Vec<u8>),
    /// The encoder hit an unrecoverable error
    Failed(String),
    /// All buffered data has been delivered; no further events follow
    Stopped,
}

/// Consumer side of a running encoder.
///
/// The event sequence is lazy, finite, and cannot be restarted: once
/// `Stopped` (or the end of the channel) is observed, `next_event` only
/// returns `None`.
pub struct EncoderHandle {
    events: mpsc::UnboundedReceiver<EncoderEvent>,
    stopper: Option<Box<dyn FnOnce() + Send>>,
    finished: bool,
}

impl EncoderHandle {
    /// Wrap an event channel and the callback that asks the encoder to finish
    pub fn new(
        events: mpsc::UnboundedReceiver<EncoderEvent>,
        stopper: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            stopper: Some(Box::new(stopper)),
            finished: false,
        }
    }

    /// Ask the encoder to flush and finish. Idempotent.
    pub fn request_stop(&mut self) {
        if let Some(stop) = self.stopper.take() {
            stop();
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stopper.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Wait for the next event. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<EncoderEvent> {
        if self.finished {
            return None;
        }

        match self.events.recv().await {
            Some(EncoderEvent::Stopped) => {
                self.finished = true;
                Some(EncoderEvent::Stopped)
            }
            Some(event) => Some(event),
            None => {
                self.finished = true;
                None
            }
        }
    }
}

impl Drop for EncoderHandle {
    fn drop(&mut self) {
        self.request_stop();
    }
}

impl std::fmt::Debug for EncoderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderHandle")
            .field("stop_requested", &self.is_stop_requested())
            .field("finished", &self.finished)
            .finish()
    }
}

/// Port for incremental audio encoding
pub trait ChunkEncoder: Send + Sync {
    /// Start encoding the stream's PCM feed.
    ///
    /// # Returns
    /// A handle yielding chunks every `options.timeslice`, or an error if the
    /// MIME type is unsupported or the stream cannot be consumed
    fn start(
        &self,
        stream: &mut MediaStream,
        options: &EncoderOptions,
    ) -> Result<EncoderHandle, EncoderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn sequence_ends_after_stopped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut handle = EncoderHandle::new(rx, || {});

        tx.send(EncoderEvent::DataAvailable(vec![1])).unwrap();
        tx.send(EncoderEvent::Stopped).unwrap();
        tx.send(EncoderEvent::DataAvailable(vec![2])).unwrap();

        assert_eq!(handle.next_event().await, Some(EncoderEvent::DataAvailable(vec![1])));
        assert_eq!(handle.next_event().await, Some(EncoderEvent::Stopped));
        assert!(handle.is_finished());
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test]
    async fn closed_channel_finishes() {
        let (tx, rx) = mpsc::unbounded_channel::<EncoderEvent>();
        let mut handle = EncoderHandle::new(rx, || {});
        drop(tx);
        assert_eq!(handle.next_event().await, None);
        assert!(handle.is_finished());
    }

    #[test]
    fn stop_runs_once_and_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::unbounded_channel();
        let counter = Arc::clone(&calls);
        let mut handle = EncoderHandle::new(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        handle.request_stop();
        handle.request_stop();
        drop(handle);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_timeslice_is_one_second() {
        let options = EncoderOptions::new("audio/webm;codecs=opus");
        assert_eq!(options.timeslice, StdDuration::from_secs(1));
    }
}
