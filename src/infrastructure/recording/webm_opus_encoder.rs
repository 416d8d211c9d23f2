//! Chunked WebM/Opus encoder
//!
//! Encodes the stream's PCM feed into 20 ms Opus packets (VOIP application,
//! tuned for speech) and hands out one WebM chunk per timeslice.

use std::time::Duration as StdDuration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, Instant};
use tracing::{debug, warn};

use super::webm::WebmMuxer;
use crate::application::ports::{
    ChunkEncoder, EncoderError, EncoderEvent, EncoderHandle, EncoderOptions, MediaStream,
    PcmReceiver,
};

/// Sample rates libopus accepts
pub const OPUS_SAMPLE_RATES: &[u32] = &[8000, 12000, 16000, 24000, 48000];

/// Frame length in milliseconds
const FRAME_MS: u64 = 20;

/// Target bitrate in bits per second
const TARGET_BITRATE: i32 = 16000;

/// Largest packet libopus can produce
const MAX_PACKET: usize = 4000;

/// How long to wait for the microphone to hand over its last samples
const FINAL_DRAIN: StdDuration = StdDuration::from_millis(500);

/// Encoder delay in `sample_rate` samples, rescaled to 48 kHz for OpusHead
fn pre_skip_at_48k(lookahead: i32, sample_rate: u32) -> u16 {
    let samples = u64::try_from(lookahead).unwrap_or(0) * 48_000 / u64::from(sample_rate.max(1));
    u16::try_from(samples).unwrap_or(u16::MAX)
}

/// Check a MIME type against the formats this encoder produces
pub fn is_supported_mime_type(mime_type: &str) -> bool {
    let normalized: String = mime_type
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "audio/webm" | "audio/webm;codecs=opus" | "audio/webm;codecs=\"opus\""
    )
}

/// Encoder adapter producing streaming WebM with one Opus track
#[derive(Debug, Default, Clone)]
pub struct WebmOpusEncoder;

impl WebmOpusEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl ChunkEncoder for WebmOpusEncoder {
    fn start(
        &self,
        stream: &mut MediaStream,
        options: &EncoderOptions,
    ) -> Result<EncoderHandle, EncoderError> {
        if !is_supported_mime_type(&options.mime_type) {
            return Err(EncoderError::UnsupportedMimeType(options.mime_type.clone()));
        }

        let sample_rate = stream.sample_rate();
        if !OPUS_SAMPLE_RATES.contains(&sample_rate) {
            return Err(EncoderError::InitFailed(format!(
                "unsupported sample rate {} Hz",
                sample_rate
            )));
        }
        let channels = match stream.channel_count() {
            1 => opus::Channels::Mono,
            2 => opus::Channels::Stereo,
            n => {
                return Err(EncoderError::InitFailed(format!(
                    "unsupported channel count {}",
                    n
                )))
            }
        };

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EncoderError::InitFailed(e.to_string()))?;

        let mut opus = opus::Encoder::new(sample_rate, channels, opus::Application::Voip)
            .map_err(|e| EncoderError::InitFailed(e.to_string()))?;
        opus.set_bitrate(opus::Bitrate::Bits(TARGET_BITRATE))
            .map_err(|e| EncoderError::InitFailed(e.to_string()))?;
        opus.set_vbr(true)
            .map_err(|e| EncoderError::InitFailed(e.to_string()))?;
        let lookahead = opus
            .get_lookahead()
            .map_err(|e| EncoderError::InitFailed(e.to_string()))?;
        let pre_skip = pre_skip_at_48k(lookahead, sample_rate);

        let pcm = stream.take_pcm().ok_or(EncoderError::StreamUnavailable)?;

        let channel_count = stream.channel_count();
        let frame_len = (sample_rate as usize * FRAME_MS as usize / 1000) * channel_count as usize;
        let task = EncodeTask {
            opus,
            muxer: WebmMuxer::new(channel_count as u8, sample_rate, pre_skip),
            pending: Vec::with_capacity(frame_len * 2),
            frame_len,
            frames: 0,
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        runtime.spawn(run(task, pcm, stop_rx, events_tx, options.timeslice));

        debug!(sample_rate, channels = channel_count, pre_skip, mime_type = %options.mime_type, "encoder started");
        Ok(EncoderHandle::new(events_rx, move || {
            let _ = stop_tx.send(());
        }))
    }
}

struct EncodeTask {
    opus: opus::Encoder,
    muxer: WebmMuxer,
    pending: Vec<i16>,
    frame_len: usize,
    frames: u64,
}

impl EncodeTask {
    fn push_pcm(&mut self, samples: &[i16]) -> Result<(), EncoderError> {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= self.frame_len {
            let frame: Vec<i16> = self.pending.drain(..self.frame_len).collect();
            self.encode_frame(&frame)?;
        }
        Ok(())
    }

    /// Encode the partial last frame, zero-padded
    fn finish(&mut self) -> Result<(), EncoderError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut frame = std::mem::take(&mut self.pending);
        frame.resize(self.frame_len, 0);
        self.encode_frame(&frame)
    }

    fn encode_frame(&mut self, frame: &[i16]) -> Result<(), EncoderError> {
        let mut packet = vec![0u8; MAX_PACKET];
        let len = self
            .opus
            .encode(frame, &mut packet)
            .map_err(|e| EncoderError::EncodeFailed(e.to_string()))?;
        packet.truncate(len);

        self.muxer.push_frame(self.frames * FRAME_MS, &packet);
        self.frames += 1;
        Ok(())
    }
}

async fn run(
    mut task: EncodeTask,
    mut pcm: PcmReceiver,
    mut stop: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<EncoderEvent>,
    timeslice: StdDuration,
) {
    let mut flush = interval_at(Instant::now() + timeslice, timeslice);
    let mut pcm_open = true;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            samples = pcm.recv(), if pcm_open => match samples {
                Some(samples) => {
                    if let Err(e) = task.push_pcm(&samples) {
                        warn!(error = %e, "encoder failed");
                        let _ = events.send(EncoderEvent::Failed(e.to_string()));
                        return;
                    }
                }
                None => {
                    debug!("microphone feed closed");
                    pcm_open = false;
                }
            },
            _ = flush.tick() => {
                let chunk = task.muxer.flush();
                if events.send(EncoderEvent::DataAvailable(chunk)).is_err() {
                    debug!("encoder consumer gone");
                    return;
                }
            }
        }
    }

    let drained = timeout(FINAL_DRAIN, async {
        while let Some(samples) = pcm.recv().await {
            task.push_pcm(&samples)?;
        }
        Ok::<(), EncoderError>(())
    })
    .await;

    let result = match drained {
        Ok(result) => result,
        Err(_) => {
            debug!("microphone still open after stop, finalizing anyway");
            Ok(())
        }
    }
    .and_then(|()| task.finish());

    if let Err(e) = result {
        warn!(error = %e, "encoder failed while finalizing");
        let _ = events.send(EncoderEvent::Failed(e.to_string()));
        return;
    }

    debug!(frames = task.frames, "encoder finished");
    let _ = events.send(EncoderEvent::DataAvailable(task.muxer.flush()));
    let _ = events.send(EncoderEvent::Stopped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MediaTrack;

    struct NullTrack;

    impl MediaTrack for NullTrack {
        fn label(&self) -> &str {
            "null"
        }

        fn is_live(&self) -> bool {
            false
        }

        fn stop(&mut self) {}
    }

    fn stream(sample_rate: u32) -> (MediaStream, mpsc::UnboundedSender<Vec<i16>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MediaStream::new(sample_rate, 1, vec![Box::new(NullTrack)], rx), tx)
    }

    async fn collect(handle: &mut EncoderHandle) -> (Vec<u8>, bool) {
        let mut data = Vec::new();
        let mut stopped = false;
        while let Some(event) = handle.next_event().await {
            match event {
                EncoderEvent::DataAvailable(chunk) => data.extend(chunk),
                EncoderEvent::Stopped => stopped = true,
                EncoderEvent::Failed(reason) => panic!("encoder failed: {}", reason),
            }
        }
        (data, stopped)
    }

    #[test]
    fn mime_types() {
        assert!(is_supported_mime_type("audio/webm;codecs=opus"));
        assert!(is_supported_mime_type("audio/webm; codecs=opus"));
        assert!(is_supported_mime_type("AUDIO/WEBM"));
        assert!(!is_supported_mime_type("audio/ogg;codecs=opus"));
        assert!(!is_supported_mime_type("audio/mp4"));
    }

    #[test]
    fn pre_skip_is_scaled_to_48k() {
        assert_eq!(pre_skip_at_48k(312, 48000), 312);
        assert_eq!(pre_skip_at_48k(52, 8000), 312);
        assert_eq!(pre_skip_at_48k(104, 16000), 312);
        assert_eq!(pre_skip_at_48k(-1, 8000), 0);
    }

    #[test]
    fn voip_encoder_reports_nonzero_pre_skip() {
        let mut opus =
            opus::Encoder::new(8000, opus::Channels::Mono, opus::Application::Voip).unwrap();
        let lookahead = opus.get_lookahead().unwrap();
        assert!(lookahead > 0);
        assert!(pre_skip_at_48k(lookahead, 8000) > 0);
    }

    #[tokio::test]
    async fn rejects_unsupported_mime_type() {
        let (mut stream, _tx) = stream(8000);
        let err = WebmOpusEncoder::new()
            .start(&mut stream, &EncoderOptions::new("audio/mp4"))
            .unwrap_err();
        assert!(matches!(err, EncoderError::UnsupportedMimeType(_)));
        // The feed is left in place for another consumer
        assert!(stream.take_pcm().is_some());
    }

    #[tokio::test]
    async fn rejects_non_opus_rate() {
        let (mut stream, _tx) = stream(44100);
        let err = WebmOpusEncoder::new()
            .start(&mut stream, &EncoderOptions::new("audio/webm"))
            .unwrap_err();
        assert!(matches!(err, EncoderError::InitFailed(_)));
    }

    #[tokio::test]
    async fn second_start_on_same_stream_fails() {
        let (mut stream, _tx) = stream(8000);
        let encoder = WebmOpusEncoder::new();
        let options = EncoderOptions::new("audio/webm;codecs=opus");
        let _handle = encoder.start(&mut stream, &options).unwrap();
        let err = encoder.start(&mut stream, &options).unwrap_err();
        assert!(matches!(err, EncoderError::StreamUnavailable));
    }

    #[tokio::test]
    async fn stop_flushes_then_reports_stopped() {
        let (mut stream, tx) = stream(8000);
        let mut handle = WebmOpusEncoder::new()
            .start(&mut stream, &EncoderOptions::new("audio/webm;codecs=opus"))
            .unwrap();

        // 250 ms of silence, with a partial trailing frame
        tx.send(vec![0i16; 2000]).unwrap();
        tokio::task::yield_now().await;
        drop(tx);
        handle.request_stop();

        let (data, stopped) = collect(&mut handle).await;
        assert!(stopped);
        assert!(data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]));
        let cluster_id = [0x1F, 0x43, 0xB6, 0x75];
        assert!(data.windows(4).any(|w| w == &cluster_id[..]));

        // OpusHead carries the encoder's delay, not zero
        let head = data.windows(8).position(|w| w == b"OpusHead").unwrap();
        let pre_skip = u16::from_le_bytes([data[head + 10], data[head + 11]]);
        assert!(pre_skip > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn emits_a_chunk_per_timeslice() {
        let (mut stream, tx) = stream(8000);
        let mut handle = WebmOpusEncoder::new()
            .start(&mut stream, &EncoderOptions::new("audio/webm"))
            .unwrap();

        tx.send(vec![0i16; 8000]).unwrap();
        let first = handle.next_event().await.unwrap();
        match first {
            EncoderEvent::DataAvailable(chunk) => assert!(chunk.starts_with(&[0x1A, 0x45, 0xDF, 0xA3])),
            other => panic!("unexpected event: {:?}", other),
        }

        let second = handle.next_event().await.unwrap();
        assert!(matches!(second, EncoderEvent::DataAvailable(_)));

        drop(tx);
        handle.request_stop();
        let (_, stopped) = collect(&mut handle).await;
        assert!(stopped);
    }
}
