//! Recording-and-submission use case
//!
//! Drives one session at a time: microphone → chunk encoder → one-second
//! countdown → finalize → submit → report or error.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::time::{interval_at, Instant, Interval};
use tracing::{debug, error, info, warn};

use crate::domain::config::Settings;
use crate::domain::feedback::{FeedbackReport, ProcessRecordingRequest};
use crate::domain::recording::{AudioFormat, Session, TickOutcome};
use crate::domain::workflow::{WorkflowError, WorkflowState, WorkflowStateMachine};

use super::ports::{
    ChunkEncoder, EncoderEvent, EncoderHandle, EncoderOptions, FeedbackService, MediaStream,
    MicrophoneSource,
};
use super::processing::ProcessingFlag;

const TICK_PERIOD: StdDuration = StdDuration::from_secs(1);

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `stop()` was called
    Manual,
    /// The countdown reached the maximum duration
    LimitReached,
    /// The encoder reported an unrecoverable error
    EncoderFailed,
}

/// Outcome of one call to [`RecordingWorkflow::next_event`]
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    /// One second elapsed
    Tick { elapsed_seconds: u64, max_seconds: u64 },
    /// A non-empty chunk was appended to the session
    ChunkCaptured { bytes: usize, total_bytes: usize },
    /// The session ended without a `stop()` call and has been processed
    Stopped {
        reason: StopReason,
        elapsed_seconds: u64,
        outcome: Result<FeedbackReport, WorkflowError>,
    },
}

/// Resources owned by an active session
struct ActiveRecording {
    session: Session,
    stream: MediaStream,
    encoder: EncoderHandle,
    timer: Interval,
}

impl ActiveRecording {
    /// Ask the encoder to finish and stop every microphone track
    fn release(&mut self) {
        self.encoder.request_stop();
        self.stream.stop_all_tracks();
    }
}

enum Step {
    Tick,
    Encoder(Option<EncoderEvent>),
}

/// The recording workflow use case
pub struct RecordingWorkflow<M, E, F>
where
    M: MicrophoneSource,
    E: ChunkEncoder,
    F: FeedbackService,
{
    microphone: M,
    encoder: E,
    feedback: F,
    settings: Arc<Settings>,
    machine: WorkflowStateMachine,
    active: Option<ActiveRecording>,
    report: Option<FeedbackReport>,
    error: Option<WorkflowError>,
    processing: ProcessingFlag,
}

impl<M, E, F> RecordingWorkflow<M, E, F>
where
    M: MicrophoneSource,
    E: ChunkEncoder,
    F: FeedbackService,
{
    /// Create a new workflow in idle state
    pub fn new(microphone: M, encoder: E, feedback: F, settings: Arc<Settings>) -> Self {
        Self {
            microphone,
            encoder,
            feedback,
            settings,
            machine: WorkflowStateMachine::new(),
            active: None,
            report: None,
            error: None,
            processing: ProcessingFlag::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.state()
    }

    pub fn is_recording(&self) -> bool {
        self.machine.is_recording()
    }

    /// True between the start of finalization and the published outcome
    pub fn is_processing(&self) -> bool {
        self.processing.is_raised()
    }

    /// Shared handle to the processing flag
    pub fn processing_flag(&self) -> ProcessingFlag {
        self.processing.clone()
    }

    /// The active session, if any
    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session().map_or(0, Session::elapsed_seconds)
    }

    /// Last published report
    pub fn report(&self) -> Option<&FeedbackReport> {
        self.report.as_ref()
    }

    /// Last published error
    pub fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Open the microphone, start the encoder and the countdown.
    ///
    /// Clears the previous report and error. Refused with
    /// `WorkflowError::InvalidState` while a session is recording or being
    /// processed.
    pub async fn start(&mut self) -> Result<(), WorkflowError> {
        self.recover_abandoned_stop();
        self.machine.ensure_can_start()?;

        self.report = None;
        self.error = None;

        let constraints = &self.settings.audio.constraints;
        info!(
            sample_rate = constraints.sample_rate,
            channel_count = constraints.channel_count,
            max_seconds = self.settings.max_duration.as_secs(),
            "starting recording"
        );

        let mut stream = match self.microphone.open(constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "failed to open microphone");
                return Err(self.fail_start());
            }
        };
        let devices: Vec<&str> = stream.tracks().iter().map(|t| t.label()).collect();
        debug!(?devices, "microphone opened");

        let options = EncoderOptions::new(self.settings.audio.mime_type.clone());
        let encoder = match self.encoder.start(&mut stream, &options) {
            Ok(handle) => handle,
            Err(e) => {
                error!(error = %e, mime_type = %options.mime_type, "failed to start encoder");
                stream.stop_all_tracks();
                return Err(self.fail_start());
            }
        };

        self.machine.begin_recording()?;
        self.active = Some(ActiveRecording {
            session: Session::start(self.settings.max_duration),
            stream,
            encoder,
            timer: interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD),
        });

        Ok(())
    }

    /// Stop the active session and process it.
    ///
    /// Returns `None` when nothing is recording.
    pub async fn stop(&mut self) -> Option<Result<FeedbackReport, WorkflowError>> {
        let Some(active) = self.active.take() else {
            debug!(state = %self.machine.state(), "stop ignored: not recording");
            return None;
        };
        Some(self.finish(active, StopReason::Manual).await)
    }

    /// Wait for the next tick or encoder event of the active session.
    ///
    /// Pends forever while no session is active. Cancel-safe: dropping the
    /// future before it completes loses no chunk and no tick.
    pub async fn next_event(&mut self) -> WorkflowEvent {
        loop {
            let step = {
                let Some(active) = self.active.as_mut() else {
                    return std::future::pending().await;
                };
                tokio::select! {
                    _ = active.timer.tick() => Step::Tick,
                    event = active.encoder.next_event() => Step::Encoder(event),
                }
            };

            match step {
                Step::Tick => {
                    let Some(active) = self.active.as_mut() else {
                        continue;
                    };
                    let max_seconds = active.session.max_seconds();
                    match active.session.tick() {
                        TickOutcome::Running(elapsed_seconds) => {
                            debug!(elapsed_seconds, "tick");
                            return WorkflowEvent::Tick {
                                elapsed_seconds,
                                max_seconds,
                            };
                        }
                        TickOutcome::LimitReached(elapsed_seconds) => {
                            info!(elapsed_seconds, "maximum duration reached, stopping");
                            return self.auto_stop(StopReason::LimitReached).await;
                        }
                        TickOutcome::Ignored => continue,
                    }
                }
                Step::Encoder(Some(EncoderEvent::DataAvailable(chunk))) => {
                    let Some(active) = self.active.as_mut() else {
                        continue;
                    };
                    let bytes = chunk.len();
                    if active.session.append_chunk(chunk) {
                        debug!(bytes, chunks = active.session.chunk_count(), "chunk captured");
                        return WorkflowEvent::ChunkCaptured {
                            bytes,
                            total_bytes: active.session.captured_bytes(),
                        };
                    }
                    debug!("discarded empty chunk");
                }
                Step::Encoder(Some(EncoderEvent::Failed(reason))) => {
                    error!(%reason, "encoder failed while recording");
                    return self.auto_stop(StopReason::EncoderFailed).await;
                }
                Step::Encoder(Some(EncoderEvent::Stopped)) | Step::Encoder(None) => {
                    error!("encoder ended before stop was requested");
                    return self.auto_stop(StopReason::EncoderFailed).await;
                }
            }
        }
    }

    /// Release every resource of the active session, whatever the state
    pub fn shutdown(&mut self) {
        if let Some(mut active) = self.active.take() {
            info!("releasing recording resources");
            active.release();
            self.machine.reset();
        }
    }

    async fn auto_stop(&mut self, reason: StopReason) -> WorkflowEvent {
        let elapsed_seconds = self.elapsed_seconds();
        let outcome = match self.active.take() {
            Some(active) => self.finish(active, reason).await,
            None => Err(WorkflowError::Processing),
        };
        WorkflowEvent::Stopped {
            reason,
            elapsed_seconds,
            outcome,
        }
    }

    /// Single stop path: release, drain the encoder, submit, publish.
    async fn finish(
        &mut self,
        active: ActiveRecording,
        reason: StopReason,
    ) -> Result<FeedbackReport, WorkflowError> {
        let _processing = self.processing.raise();

        let ActiveRecording {
            mut session,
            mut stream,
            mut encoder,
            timer,
        } = active;
        drop(timer);
        encoder.request_stop();
        stream.stop_all_tracks();
        session.mark_stopped();

        self.machine.begin_finalizing()?;
        info!(
            ?reason,
            elapsed_seconds = session.elapsed_seconds(),
            "recording stopped, finalizing"
        );

        let result = self.finalize(session, encoder, reason).await;
        drop(stream);

        match result {
            Ok(report) => {
                self.machine.complete()?;
                info!(confidence = report.confidence, "feedback received");
                self.error = None;
                self.report = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                self.machine.fail_processing()?;
                self.publish_error(&e);
                Err(e)
            }
        }
    }

    async fn finalize(
        &mut self,
        mut session: Session,
        mut encoder: EncoderHandle,
        reason: StopReason,
    ) -> Result<FeedbackReport, WorkflowError> {
        if reason == StopReason::EncoderFailed {
            return Err(WorkflowError::Processing);
        }

        loop {
            match encoder.next_event().await {
                Some(EncoderEvent::DataAvailable(chunk)) => {
                    session.append_chunk(chunk);
                }
                Some(EncoderEvent::Stopped) => break,
                Some(EncoderEvent::Failed(reason)) => {
                    error!(%reason, "encoder failed while finalizing");
                    return Err(WorkflowError::Processing);
                }
                None => {
                    error!("encoder ended without finalizing");
                    return Err(WorkflowError::Processing);
                }
            }
        }

        self.machine.begin_submitting()?;

        let payload = session.drain(AudioFormat::Webm);
        if payload.is_empty() {
            error!("recording produced no audio");
            return Err(WorkflowError::Processing);
        }

        let request = ProcessRecordingRequest::from_payload(
            &payload,
            self.settings.audio.constraints.sample_rate,
        );
        info!(
            size = %payload.human_readable_size(),
            url = %self.settings.api.url(),
            "submitting recording"
        );

        self.feedback.process_recording(&request).await.map_err(|e| {
            error!(error = %e, "feedback request failed");
            WorkflowError::Processing
        })
    }

    fn fail_start(&mut self) -> WorkflowError {
        if let Err(e) = self.machine.fail_to_start() {
            warn!(error = %e, "unexpected state after failed start");
        }
        let err = WorkflowError::MicrophoneAccess;
        self.publish_error(&err);
        err
    }

    /// Outcome errors replace the report; refusals leave both slots alone
    fn publish_error(&mut self, err: &WorkflowError) {
        if err.is_outcome() {
            self.report = None;
            self.error = Some(err.clone());
        } else {
            warn!(error = %err, "refused transition not published");
        }
    }

    /// A dropped `stop()` future leaves the machine mid-processing with the
    /// flag already lowered; bring it back to idle.
    fn recover_abandoned_stop(&mut self) {
        if self.machine.is_processing() && !self.processing.is_raised() {
            warn!(state = %self.machine.state(), "previous stop was abandoned, resetting");
            self.machine.reset();
        }
    }
}

impl<M, E, F> Drop for RecordingWorkflow<M, E, F>
where
    M: MicrophoneSource,
    E: ChunkEncoder,
    F: FeedbackService,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        EncoderError, FeedbackError, MediaTrack, MicrophoneError,
    };
    use crate::domain::config::AppConfig;
    use crate::domain::recording::{AudioConstraints, Duration};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    struct MockTrack {
        live: bool,
        stops: Arc<AtomicUsize>,
    }

    impl MediaTrack for MockTrack {
        fn label(&self) -> &str {
            "mock"
        }

        fn is_live(&self) -> bool {
            self.live
        }

        fn stop(&mut self) {
            self.live = false;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct MockMicrophone {
        fail: bool,
        stops: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MicrophoneSource for MockMicrophone {
        async fn open(&self, c: &AudioConstraints) -> Result<MediaStream, MicrophoneError> {
            if self.fail {
                return Err(MicrophoneError::PermissionDenied("denied".into()));
            }
            let (_tx, rx) = mpsc::unbounded_channel();
            let track = MockTrack {
                live: true,
                stops: Arc::clone(&self.stops),
            };
            Ok(MediaStream::new(c.sample_rate, c.channel_count, vec![Box::new(track)], rx))
        }
    }

    #[derive(Default)]
    struct MockEncoder {
        fail_start: bool,
        sender: Arc<Mutex<Option<mpsc::UnboundedSender<EncoderEvent>>>>,
    }

    impl MockEncoder {
        fn emit(&self, event: EncoderEvent) {
            if let Some(tx) = self.sender.lock().unwrap().as_ref() {
                tx.send(event).unwrap();
            }
        }
    }

    impl ChunkEncoder for MockEncoder {
        fn start(
            &self,
            _stream: &mut MediaStream,
            options: &EncoderOptions,
        ) -> Result<EncoderHandle, EncoderError> {
            if self.fail_start {
                return Err(EncoderError::UnsupportedMimeType(options.mime_type.clone()));
            }
            let (tx, rx) = mpsc::unbounded_channel();
            *self.sender.lock().unwrap() = Some(tx);
            let sender = Arc::clone(&self.sender);
            Ok(EncoderHandle::new(rx, move || {
                if let Some(tx) = sender.lock().unwrap().take() {
                    let _ = tx.send(EncoderEvent::DataAvailable(vec![9]));
                    let _ = tx.send(EncoderEvent::Stopped);
                }
            }))
        }
    }

    struct MockFeedback {
        fail: bool,
        calls: AtomicUsize,
        saw_processing: Arc<AtomicBool>,
        flag: Mutex<Option<ProcessingFlag>>,
    }

    impl MockFeedback {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: AtomicUsize::new(0),
                saw_processing: Arc::new(AtomicBool::new(false)),
                flag: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl FeedbackService for MockFeedback {
        async fn process_recording(
            &self,
            _request: &ProcessRecordingRequest,
        ) -> Result<FeedbackReport, FeedbackError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(flag) = self.flag.lock().unwrap().as_ref() {
                self.saw_processing.store(flag.is_raised(), Ordering::SeqCst);
            }
            if self.fail {
                return Err(FeedbackError::Status(500));
            }
            Ok(FeedbackReport {
                confidence: 90.0,
                pronunciation_mistakes: vec![],
                overall_feedback: "Clear".into(),
                audio_feedback: None,
            })
        }
    }

    fn settings(max_secs: u64) -> Arc<Settings> {
        let mut settings = AppConfig::defaults().resolve().unwrap();
        settings.max_duration = Duration::from_secs(max_secs);
        Arc::new(settings)
    }

    fn workflow(
        mic: MockMicrophone,
        enc: MockEncoder,
        fb: MockFeedback,
    ) -> RecordingWorkflow<MockMicrophone, MockEncoder, MockFeedback> {
        RecordingWorkflow::new(mic, enc, fb, settings(1200))
    }

    #[tokio::test]
    async fn start_from_idle_enters_recording() {
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), MockFeedback::new(false));
        assert_eq!(wf.state(), WorkflowState::Idle);

        wf.start().await.unwrap();
        assert_eq!(wf.state(), WorkflowState::Recording);
        assert_eq!(wf.elapsed_seconds(), 0);
        assert!(wf.session().is_some());
    }

    #[tokio::test]
    async fn start_while_recording_is_refused() {
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), MockFeedback::new(false));
        wf.start().await.unwrap();

        let err = wf.start().await.unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState(_)));
        assert!(wf.error().is_none());
        assert_eq!(wf.state(), WorkflowState::Recording);
    }

    #[tokio::test]
    async fn refusals_never_occupy_the_error_slot() {
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), MockFeedback::new(false));
        let refusal = WorkflowError::from(crate::domain::workflow::InvalidStateTransition {
            current_state: WorkflowState::Submitting,
            action: "stop recording".to_string(),
        });

        wf.publish_error(&refusal);
        assert!(wf.error().is_none());

        wf.publish_error(&WorkflowError::Processing);
        wf.publish_error(&refusal);
        assert_eq!(wf.error(), Some(&WorkflowError::Processing));
    }

    #[tokio::test]
    async fn microphone_failure_sets_error() {
        let mic = MockMicrophone {
            fail: true,
            ..Default::default()
        };
        let mut wf = workflow(mic, MockEncoder::default(), MockFeedback::new(false));

        let err = wf.start().await.unwrap_err();
        assert_eq!(err, WorkflowError::MicrophoneAccess);
        assert_eq!(wf.state(), WorkflowState::Failed);
        assert_eq!(wf.error(), Some(&WorkflowError::MicrophoneAccess));
        assert!(wf.session().is_none());
    }

    #[tokio::test]
    async fn encoder_start_failure_releases_stream() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mic = MockMicrophone {
            fail: false,
            stops: Arc::clone(&stops),
        };
        let enc = MockEncoder {
            fail_start: true,
            ..Default::default()
        };
        let mut wf = workflow(mic, enc, MockFeedback::new(false));

        let err = wf.start().await.unwrap_err();
        assert_eq!(err, WorkflowError::MicrophoneAccess);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(wf.state(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn stop_when_idle_is_noop() {
        let fb = MockFeedback::new(false);
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), fb);

        assert!(wf.stop().await.is_none());
        assert_eq!(wf.state(), WorkflowState::Idle);
        assert!(wf.report().is_none());
        assert!(wf.error().is_none());
    }

    #[tokio::test]
    async fn manual_stop_publishes_report_and_stops_tracks() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mic = MockMicrophone {
            fail: false,
            stops: Arc::clone(&stops),
        };
        let mut wf = workflow(mic, MockEncoder::default(), MockFeedback::new(false));
        wf.start().await.unwrap();

        let report = wf.stop().await.unwrap().unwrap();
        assert_eq!(report.overall_feedback, "Clear");
        assert_eq!(wf.state(), WorkflowState::Done);
        assert_eq!(wf.report(), Some(&report));
        assert!(wf.error().is_none());
        assert!(!wf.is_processing());
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn processing_flag_raised_during_submission() {
        let fb = MockFeedback::new(false);
        let saw = Arc::clone(&fb.saw_processing);
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), fb);
        *wf.feedback.flag.lock().unwrap() = Some(wf.processing_flag());

        wf.start().await.unwrap();
        assert!(!wf.is_processing());
        wf.stop().await.unwrap().unwrap();

        assert!(saw.load(Ordering::SeqCst));
        assert!(!wf.is_processing());
    }

    #[tokio::test]
    async fn service_failure_sets_processing_error() {
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), MockFeedback::new(true));
        wf.start().await.unwrap();

        let err = wf.stop().await.unwrap().unwrap_err();
        assert_eq!(err, WorkflowError::Processing);
        assert_eq!(wf.state(), WorkflowState::Failed);
        assert!(wf.report().is_none());
        assert!(!wf.is_processing());
    }

    #[tokio::test]
    async fn restart_after_failure_clears_error() {
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), MockFeedback::new(true));
        wf.start().await.unwrap();
        wf.stop().await.unwrap().unwrap_err();
        assert!(wf.error().is_some());

        wf.start().await.unwrap();
        assert!(wf.error().is_none());
        assert_eq!(wf.state(), WorkflowState::Recording);
    }

    #[tokio::test]
    async fn chunks_are_reported_and_empty_ones_skipped() {
        let enc = MockEncoder::default();
        let sender = Arc::clone(&enc.sender);
        let mut wf = workflow(MockMicrophone::default(), enc, MockFeedback::new(false));
        wf.start().await.unwrap();

        let tx = sender.lock().unwrap().clone().unwrap();
        tx.send(EncoderEvent::DataAvailable(vec![])).unwrap();
        tx.send(EncoderEvent::DataAvailable(vec![1, 2, 3])).unwrap();

        let event = wf.next_event().await;
        assert_eq!(
            event,
            WorkflowEvent::ChunkCaptured {
                bytes: 3,
                total_bytes: 3
            }
        );
        assert_eq!(wf.session().unwrap().chunk_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_arrives_after_one_second() {
        let mut wf = workflow(MockMicrophone::default(), MockEncoder::default(), MockFeedback::new(false));
        wf.start().await.unwrap();
        let started = Instant::now();

        let event = wf.next_event().await;
        assert_eq!(
            event,
            WorkflowEvent::Tick {
                elapsed_seconds: 1,
                max_seconds: 1200
            }
        );
        assert_eq!(started.elapsed(), StdDuration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn limit_triggers_auto_stop() {
        let mut wf = RecordingWorkflow::new(
            MockMicrophone::default(),
            MockEncoder::default(),
            MockFeedback::new(false),
            settings(3),
        );
        wf.start().await.unwrap();

        assert!(matches!(wf.next_event().await, WorkflowEvent::Tick { elapsed_seconds: 1, .. }));
        assert!(matches!(wf.next_event().await, WorkflowEvent::Tick { elapsed_seconds: 2, .. }));

        match wf.next_event().await {
            WorkflowEvent::Stopped {
                reason,
                elapsed_seconds,
                outcome,
            } => {
                assert_eq!(reason, StopReason::LimitReached);
                assert_eq!(elapsed_seconds, 3);
                assert!(outcome.is_ok());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(wf.state(), WorkflowState::Done);
    }

    #[tokio::test]
    async fn encoder_failure_while_recording_stops_with_error() {
        let enc = MockEncoder::default();
        let mut wf = workflow(MockMicrophone::default(), enc, MockFeedback::new(false));
        wf.start().await.unwrap();

        wf.encoder.emit(EncoderEvent::Failed("codec exploded".into()));

        match wf.next_event().await {
            WorkflowEvent::Stopped { reason, outcome, .. } => {
                assert_eq!(reason, StopReason::EncoderFailed);
                assert_eq!(outcome, Err(WorkflowError::Processing));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(wf.feedback.calls.load(Ordering::SeqCst), 0);
        assert_eq!(wf.error(), Some(&WorkflowError::Processing));
    }

    #[tokio::test]
    async fn shutdown_releases_tracks() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mic = MockMicrophone {
            fail: false,
            stops: Arc::clone(&stops),
        };
        let mut wf = workflow(mic, MockEncoder::default(), MockFeedback::new(false));
        wf.start().await.unwrap();

        wf.shutdown();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(wf.state(), WorkflowState::Idle);

        wf.shutdown();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn drop_releases_tracks() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mic = MockMicrophone {
            fail: false,
            stops: Arc::clone(&stops),
        };
        let mut wf = workflow(mic, MockEncoder::default(), MockFeedback::new(false));
        wf.start().await.unwrap();

        drop(wf);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
