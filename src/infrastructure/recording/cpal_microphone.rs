//! Microphone source using cpal
//!
//! The cpal stream is not `Send`, so it lives on a dedicated capture thread.
//! That thread down-mixes device frames, resamples them to the requested
//! rate, and forwards i16 PCM to the stream's feed. Stopping the track
//! signals the thread and joins it, off the async worker when a runtime is
//! present.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::ports::{MediaStream, MediaTrack, MicrophoneError, MicrophoneSource};
use crate::domain::recording::AudioConstraints;

/// Resampler input block size in frames
const RESAMPLE_CHUNK: usize = 1024;

/// How long the capture loop waits for device data before checking for stop
const POLL_INTERVAL: StdDuration = StdDuration::from_millis(50);

/// Microphone source backed by the default cpal input device
#[derive(Debug, Default, Clone)]
pub struct CpalMicrophone;

impl CpalMicrophone {
    pub fn new() -> Self {
        Self
    }

    fn get_input_device() -> Result<cpal::Device, MicrophoneError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(MicrophoneError::NoAudioDevice)
    }

    /// Pick a device configuration, preferring fewer channels and one that
    /// covers the requested rate
    fn get_input_config(
        device: &cpal::Device,
        target_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), MicrophoneError> {
        let supported = device
            .supported_input_configs()
            .map_err(|e| MicrophoneError::OpenFailed(format!("Failed to get configs: {}", e)))?;

        let covers = |range: &cpal::SupportedStreamConfigRange| {
            range.min_sample_rate().0 <= target_rate && range.max_sample_rate().0 >= target_rate
        };

        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for range in supported {
            if !matches!(range.sample_format(), SampleFormat::I16 | SampleFormat::F32) {
                continue;
            }
            let is_better = match &best {
                None => true,
                Some(current) => {
                    (covers(&range) && !covers(current))
                        || (covers(&range) == covers(current)
                            && range.channels() < current.channels())
                }
            };
            if is_better {
                best = Some(range);
            }
        }

        let range = best.ok_or_else(|| {
            MicrophoneError::Unsupported("no i16 or f32 input configuration".into())
        })?;

        let sample_rate = if covers(&range) {
            SampleRate(target_rate)
        } else {
            range.max_sample_rate().min(SampleRate(48_000)).max(range.min_sample_rate())
        };

        Ok((
            StreamConfig {
                channels: range.channels(),
                sample_rate,
                buffer_size: cpal::BufferSize::Default,
            },
            range.sample_format(),
        ))
    }
}

#[async_trait]
impl MicrophoneSource for CpalMicrophone {
    async fn open(&self, constraints: &AudioConstraints) -> Result<MediaStream, MicrophoneError> {
        if constraints.wants_voice_processing() {
            debug!(
                echo_cancellation = constraints.echo_cancellation,
                noise_suppression = constraints.noise_suppression,
                auto_gain_control = constraints.auto_gain_control,
                "voice processing requested; not available from the host audio API, ignoring"
            );
        }

        let constraints = *constraints;
        let running = Arc::new(AtomicBool::new(true));
        let (pcm_tx, pcm_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);

        let thread_running = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || capture_thread(constraints, thread_running, pcm_tx, ready_tx))
            .map_err(|e| MicrophoneError::OpenFailed(format!("Failed to spawn capture thread: {}", e)))?;

        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| MicrophoneError::OpenFailed(format!("Task join error: {}", e)))?;

        let label = match ready {
            Ok(Ok(label)) => label,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(MicrophoneError::OpenFailed("capture thread exited".into()));
            }
        };

        info!(device = %label, sample_rate = constraints.sample_rate, "microphone opened");

        let track = CpalTrack {
            label,
            running,
            thread: Some(thread),
        };
        Ok(MediaStream::new(
            constraints.sample_rate,
            constraints.channel_count,
            vec![Box::new(track)],
            pcm_rx,
        ))
    }
}

/// Capture track owning the capture thread
struct CpalTrack {
    label: String,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl MediaTrack for CpalTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.thread.is_some()
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            join_capture_thread(handle, self.label.clone());
        }
    }
}

/// Join a signalled capture thread. The thread exits within one
/// `POLL_INTERVAL` plus the resampler flush; inside a tokio runtime the
/// wait moves to the blocking pool so `stop()` never stalls a worker.
fn join_capture_thread(handle: JoinHandle<()>, label: String) {
    let join = move || {
        if handle.join().is_err() {
            warn!(device = %label, "capture thread panicked");
        }
        debug!(device = %label, "microphone track stopped");
    };

    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(join);
        }
        Err(_) => join(),
    }
}

impl Drop for CpalTrack {
    fn drop(&mut self) {
        self.stop();
    }
}

fn capture_thread(
    constraints: AudioConstraints,
    running: Arc<AtomicBool>,
    pcm_tx: mpsc::UnboundedSender<Vec<i16>>,
    ready_tx: std_mpsc::SyncSender<Result<String, MicrophoneError>>,
) {
    let opened = open_device_stream(constraints.sample_rate);
    let (stream, device_rx, device_rate, device_channels, label) = match opened {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let mut converter =
        match PcmConverter::new(device_rate, device_channels, constraints.sample_rate, constraints.channel_count) {
            Ok(c) => c,
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(MicrophoneError::OpenFailed(e.to_string())));
        return;
    }
    let _ = ready_tx.send(Ok(label));

    while running.load(Ordering::SeqCst) {
        match device_rx.recv_timeout(POLL_INTERVAL) {
            Ok(samples) => forward(&mut converter, &samples, &pcm_tx),
            Err(std_mpsc::RecvTimeoutError::Timeout) => {}
            Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(stream);
    while let Ok(samples) = device_rx.try_recv() {
        forward(&mut converter, &samples, &pcm_tx);
    }
    match converter.flush() {
        Ok(tail) if !tail.is_empty() => {
            let _ = pcm_tx.send(tail);
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "failed to flush resampler"),
    }
}

fn forward(converter: &mut PcmConverter, samples: &[f32], pcm_tx: &mpsc::UnboundedSender<Vec<i16>>) {
    match converter.push(samples) {
        Ok(pcm) if !pcm.is_empty() => {
            let _ = pcm_tx.send(pcm);
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "dropping audio block"),
    }
}

type DeviceStream = (cpal::Stream, std_mpsc::Receiver<Vec<f32>>, u32, u16, String);

/// Build and return the (not yet playing) device stream and its sample feed
fn open_device_stream(target_rate: u32) -> Result<DeviceStream, MicrophoneError> {
    let device = CpalMicrophone::get_input_device()?;
    let label = device.name().unwrap_or_else(|_| "default input".to_string());
    let (config, sample_format) = CpalMicrophone::get_input_config(&device, target_rate)?;
    let (tx, rx) = std_mpsc::channel::<Vec<f32>>();

    let on_error = |err: cpal::StreamError| warn!(error = %err, "audio stream error");

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(data.iter().map(|&s| s as f32 / 32768.0).collect());
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = tx.send(data.to_vec());
            },
            on_error,
            None,
        ),
        other => {
            return Err(MicrophoneError::Unsupported(format!(
                "sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            MicrophoneError::PermissionDenied("input device not available".into())
        }
        other => MicrophoneError::OpenFailed(other.to_string()),
    })?;

    Ok((stream, rx, config.sample_rate.0, config.channels, label))
}

/// Converts interleaved device samples to interleaved i16 at the target
/// rate and channel count
struct PcmConverter {
    device_channels: u16,
    target_channels: u16,
    resampler: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
}

impl PcmConverter {
    fn new(
        device_rate: u32,
        device_channels: u16,
        target_rate: u32,
        target_channels: u16,
    ) -> Result<Self, MicrophoneError> {
        let resampler = if device_rate == target_rate {
            None
        } else {
            debug!(device_rate, target_rate, "resampling microphone input");
            Some(
                FftFixedIn::<f32>::new(
                    device_rate as usize,
                    target_rate as usize,
                    RESAMPLE_CHUNK,
                    2,
                    1,
                )
                .map_err(|e| MicrophoneError::Unsupported(format!("Resampler init failed: {}", e)))?,
            )
        };

        Ok(Self {
            device_channels: device_channels.max(1),
            target_channels: target_channels.max(1),
            resampler,
            pending: Vec::new(),
        })
    }

    /// Feed one device block; returns whatever output is ready
    fn push(&mut self, interleaved: &[f32]) -> Result<Vec<i16>, rubato::ResampleError> {
        let mono = downmix(interleaved, self.device_channels);
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(self.to_output(&mono));
        };

        self.pending.extend_from_slice(&mono);
        let mut out = Vec::new();
        loop {
            let needed = resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let block: Vec<Vec<f32>> = vec![self.pending.drain(..needed).collect()];
            let resampled = resampler.process(&block, None)?;
            out.extend_from_slice(&resampled[0]);
        }
        Ok(self.to_output(&out))
    }

    /// Push out the partially filled resampler block, zero-padded
    fn flush(&mut self) -> Result<Vec<i16>, rubato::ResampleError> {
        let Some(resampler) = self.resampler.as_mut() else {
            return Ok(Vec::new());
        };
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let needed = resampler.input_frames_next();
        let mut block = std::mem::take(&mut self.pending);
        let real = block.len();
        block.resize(needed, 0.0);

        let resampled = resampler.process(&vec![block], None)?;
        let keep = (resampled[0].len() * real).div_ceil(needed);
        let out: Vec<f32> = resampled[0][..keep.min(resampled[0].len())].to_vec();
        Ok(self.to_output(&out))
    }

    fn to_output(&self, mono: &[f32]) -> Vec<i16> {
        let channels = self.target_channels as usize;
        let mut out = Vec::with_capacity(mono.len() * channels);
        for &sample in mono {
            let s = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            out.extend(std::iter::repeat(s).take(channels));
        }
        out
    }
}

/// Average interleaved frames down to one channel
fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
