//! Session runners for interactive and one-shot modes

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, warn};

use crate::application::ports::{
    ChunkEncoder, ConfigStore, FeedbackPlayer, FeedbackService, MicrophoneSource,
};
use crate::application::{PlayFeedbackUseCase, RecordingWorkflow, StopReason, WorkflowEvent};
use crate::domain::config::{parse_base_url, ApiConfig, AppConfig, Settings};
use crate::domain::error::ConfigError;
use crate::domain::feedback::FeedbackReport;
use crate::domain::recording::Duration;
use crate::domain::workflow::WorkflowError;
use crate::infrastructure::{
    create_player, CpalMicrophone, HttpFeedbackService, WebmOpusEncoder, XdgConfigStore,
};

use super::controls::{ControlHandler, ControlSignal, ShutdownSignal};
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

const PROCESSING_MESSAGE: &str = "Processing your presentation...";
const FLAG_POLL: StdDuration = StdDuration::from_millis(100);

/// How reports are shown once they arrive
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Print the report as JSON on stdout
    pub json: bool,
    /// Play audio feedback as soon as the report arrives
    pub autoplay: bool,
}

/// Counters for one interactive run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub reports: usize,
    pub failures: usize,
}

/// The workflow wired to real hardware and the HTTP endpoint
pub type LiveWorkflow = RecordingWorkflow<CpalMicrophone, WebmOpusEncoder, HttpFeedbackService>;

/// Build the production workflow from resolved settings
pub fn build_workflow(settings: Arc<Settings>) -> LiveWorkflow {
    let feedback = HttpFeedbackService::new(&settings.api);
    RecordingWorkflow::new(
        CpalMicrophone::new(),
        WebmOpusEncoder::new(),
        feedback,
        settings,
    )
}

/// Run the interactive session (Enter toggles, `p` plays, `q` quits)
pub async fn run_interactive(settings: Arc<Settings>, output: OutputOptions) -> ExitCode {
    let presenter = Presenter::new();

    let controls = match ControlHandler::new() {
        Ok(controls) => controls,
        Err(e) => {
            presenter.error(&format!("Failed to setup input handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let workflow = build_workflow(Arc::clone(&settings));
    let player = PlayFeedbackUseCase::new(create_player(true));

    presenter.info(&format!(
        "Maximum session length: {}",
        settings.max_duration
    ));
    presenter.controls_hint();

    let summary = drive_session(workflow, controls, &player, output, presenter).await;
    debug!(
        reports = summary.reports,
        failures = summary.failures,
        "session ended"
    );

    ExitCode::from(EXIT_SUCCESS)
}

/// Drive a workflow from control signals until Quit.
///
/// Consumes the workflow so that every resource is released on return.
pub async fn drive_session<M, E, F, P>(
    mut workflow: RecordingWorkflow<M, E, F>,
    mut controls: ControlHandler,
    player: &PlayFeedbackUseCase<P>,
    output: OutputOptions,
    mut presenter: Presenter,
) -> SessionSummary
where
    M: MicrophoneSource,
    E: ChunkEncoder,
    F: FeedbackService,
    P: FeedbackPlayer,
{
    enum Wake {
        Event(WorkflowEvent),
        Control(Option<ControlSignal>),
    }

    let flag = workflow.processing_flag();
    let mut poll = interval(FLAG_POLL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut summary = SessionSummary::default();
    let mut quit_requested = false;
    let mut controls_open = true;

    loop {
        let wake = {
            let event = workflow.next_event();
            tokio::pin!(event);
            let mut processing_shown = false;
            loop {
                tokio::select! {
                    biased;
                    ev = &mut event => break Wake::Event(ev),
                    ctl = controls.recv(), if controls_open => {
                        // Dropping `event` mid-submission would abandon the request
                        if flag.is_raised() {
                            match ctl {
                                Some(ControlSignal::Quit) => quit_requested = true,
                                None => {
                                    controls_open = false;
                                    quit_requested = true;
                                }
                                Some(_) => presenter.warn("Still processing, please wait"),
                            }
                        } else {
                            break Wake::Control(ctl);
                        }
                    }
                    _ = poll.tick() => {
                        if flag.is_raised() && !processing_shown {
                            processing_shown = true;
                            presenter.start_spinner(PROCESSING_MESSAGE);
                        }
                    }
                }
            }
        };

        match wake {
            Wake::Event(WorkflowEvent::Tick {
                elapsed_seconds,
                max_seconds,
            }) => presenter.recording_progress(elapsed_seconds, max_seconds),
            Wake::Event(WorkflowEvent::ChunkCaptured { .. }) => {}
            Wake::Event(WorkflowEvent::Stopped {
                reason, outcome, ..
            }) => {
                if reason == StopReason::LimitReached {
                    presenter.warn("Maximum duration reached, recording stopped");
                }
                present_outcome(&mut presenter, outcome, player, output, &mut summary).await;
            }
            Wake::Control(Some(ControlSignal::Toggle)) => {
                if workflow.is_recording() {
                    presenter.start_spinner(PROCESSING_MESSAGE);
                    if let Some(outcome) = workflow.stop().await {
                        present_outcome(&mut presenter, outcome, player, output, &mut summary)
                            .await;
                    }
                    quit_requested |= controls.discard_pending();
                } else {
                    match workflow.start().await {
                        Ok(()) => {
                            let max_secs = workflow.settings().max_duration.as_secs();
                            presenter.recording_started(max_secs);
                        }
                        Err(e) => presenter.error(&e.to_string()),
                    }
                }
            }
            Wake::Control(Some(ControlSignal::Play)) => {
                if workflow.is_recording() {
                    presenter.warn("Stop recording before playing feedback");
                } else {
                    match workflow.report() {
                        Some(report) => {
                            let report = report.clone();
                            play_report(&presenter, player, &report).await;
                        }
                        None => presenter.warn("No feedback to play yet"),
                    }
                }
            }
            Wake::Control(Some(ControlSignal::Quit)) | Wake::Control(None) => {
                quit_requested = true;
            }
        }

        if quit_requested {
            presenter.stop_spinner();
            workflow.shutdown();
            break;
        }
    }

    summary
}

/// Record once for `duration`, print the report and exit
pub async fn run_oneshot(
    settings: Arc<Settings>,
    duration: Duration,
    output: OutputOptions,
) -> ExitCode {
    let mut presenter = Presenter::new();

    let mut shutdown = match ShutdownSignal::new() {
        Ok(signal) => signal,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let player = PlayFeedbackUseCase::new(create_player(output.autoplay));
    let mut workflow = build_workflow(Arc::clone(&settings));

    if duration > settings.max_duration {
        presenter.warn(&format!(
            "Recording is capped at {} (requested {})",
            settings.max_duration, duration
        ));
    }

    if let Err(e) = workflow.start().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.recording_started(settings.max_duration.as_secs().min(duration.as_secs()));

    let deadline = sleep(duration.as_std());
    tokio::pin!(deadline);
    let limit = settings.max_duration.as_secs().min(duration.as_secs());

    let outcome = loop {
        tokio::select! {
            event = workflow.next_event() => match event {
                WorkflowEvent::Tick { elapsed_seconds, .. } => {
                    presenter.recording_progress(elapsed_seconds, limit);
                }
                WorkflowEvent::ChunkCaptured { .. } => {}
                WorkflowEvent::Stopped { outcome, .. } => break outcome,
            },
            _ = &mut deadline => {
                presenter.start_spinner(PROCESSING_MESSAGE);
                match workflow.stop().await {
                    Some(outcome) => break outcome,
                    None => break Err(WorkflowError::Processing),
                }
            }
            _ = shutdown.recv() => {
                presenter.stop_spinner();
                workflow.shutdown();
                presenter.warn("Recording cancelled");
                return ExitCode::from(EXIT_ERROR);
            }
        }
    };

    let mut summary = SessionSummary::default();
    present_outcome(&mut presenter, outcome, &player, output, &mut summary).await;

    if summary.failures == 0 {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

async fn present_outcome<P: FeedbackPlayer>(
    presenter: &mut Presenter,
    outcome: Result<FeedbackReport, WorkflowError>,
    player: &PlayFeedbackUseCase<P>,
    output: OutputOptions,
    summary: &mut SessionSummary,
) {
    match outcome {
        Ok(report) => {
            summary.reports += 1;
            presenter.spinner_success("Feedback ready");
            print_report(presenter, &report, output.json);
            if output.autoplay {
                play_report(presenter, player, &report).await;
            } else if report.has_audio_feedback() && !output.json {
                presenter.info("Press p and Enter to hear the audio feedback");
            }
        }
        Err(e) => {
            summary.failures += 1;
            if presenter.is_spinner_active() {
                presenter.spinner_fail(&e.to_string());
            } else {
                presenter.error(&e.to_string());
            }
        }
    }
}

fn print_report(presenter: &Presenter, report: &FeedbackReport, json: bool) {
    if !json {
        presenter.report(report);
        return;
    }
    match serde_json::to_string_pretty(report) {
        Ok(text) => presenter.output(&text),
        Err(e) => {
            warn!(error = %e, "failed to serialize report");
            presenter.report(report);
        }
    }
}

async fn play_report<P: FeedbackPlayer>(
    presenter: &Presenter,
    player: &PlayFeedbackUseCase<P>,
    report: &FeedbackReport,
) {
    match player.execute(report).await {
        Ok(true) => presenter.success("Playback finished"),
        Ok(false) => presenter.info("This report has no audio feedback"),
        Err(e) => {
            warn!(error = %e, "playback failed");
            presenter.warn(&format!("Could not play audio feedback: {}", e));
        }
    }
}

/// Split a full endpoint URL into base URL and path
pub fn split_endpoint(endpoint: &str) -> Result<ApiConfig, ConfigError> {
    let url = parse_base_url(endpoint.trim())?;
    let path = url.path().trim_end_matches('/');

    let mut base = url.clone();
    base.set_path("");
    let base_url = base.as_str().trim_end_matches('/').to_string();

    Ok(ApiConfig {
        base_url: Some(base_url),
        process_recording_path: if path.is_empty() {
            None
        } else {
            Some(path.to_string())
        },
    })
}

/// Load and merge configuration: defaults < file < CLI/env
pub async fn load_merged_config(cli_config: AppConfig) -> Result<AppConfig, ConfigError> {
    let store = XdgConfigStore::new();
    let file_config = store.load().await?;

    Ok(AppConfig::defaults().merge(file_config).merge(cli_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_endpoint_with_path() {
        let api = split_endpoint("http://localhost:3000/process-recording").unwrap();
        assert_eq!(api.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(
            api.process_recording_path.as_deref(),
            Some("/process-recording")
        );
    }

    #[test]
    fn split_endpoint_with_stage_prefix() {
        let api = split_endpoint("https://api.example.com/prod/process-recording").unwrap();
        assert_eq!(api.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(
            api.process_recording_path.as_deref(),
            Some("/prod/process-recording")
        );
    }

    #[test]
    fn split_endpoint_without_path_keeps_default_path() {
        let api = split_endpoint("http://localhost:3000/").unwrap();
        assert_eq!(api.base_url.as_deref(), Some("http://localhost:3000"));
        assert!(api.process_recording_path.is_none());

        let merged = AppConfig::defaults().merge(AppConfig {
            api: Some(api),
            ..Default::default()
        });
        let settings = merged.resolve().unwrap();
        assert_eq!(
            settings.api.url().as_str(),
            "http://localhost:3000/process-recording"
        );
    }

    #[test]
    fn split_endpoint_rejects_query_string() {
        let err = split_endpoint("http://localhost:3000?stage=prod").unwrap_err();
        assert!(err.to_string().contains("api.base_url"));
        assert!(split_endpoint("http://localhost:3000/process-recording?x=1").is_err());
        assert!(split_endpoint("http://localhost:3000/process-recording#top").is_err());
    }

    #[test]
    fn split_endpoint_rejects_missing_host_and_bad_port() {
        assert!(split_endpoint("http://:80/process-recording").is_err());
        assert!(split_endpoint("http://host:notaport/process-recording").is_err());
        assert!(split_endpoint("localhost:3000/process-recording").is_err());
    }

    #[test]
    fn split_endpoint_keeps_explicit_port() {
        let api = split_endpoint("http://127.0.0.1:8080/api/process-recording/").unwrap();
        assert_eq!(api.base_url.as_deref(), Some("http://127.0.0.1:8080"));
        assert_eq!(
            api.process_recording_path.as_deref(),
            Some("/api/process-recording")
        );
    }

    #[test]
    fn summary_starts_empty() {
        assert_eq!(
            SessionSummary::default(),
            SessionSummary {
                reports: 0,
                failures: 0
            }
        );
    }
}
