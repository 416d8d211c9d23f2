//! Application configuration value object

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::error::ConfigError;
use crate::domain::recording::{AudioConstraints, Duration};

use super::settings::{ApiSettings, AudioSettings, Settings};

/// Default capture sample rate (8kHz keeps the upload small)
pub const DEFAULT_SAMPLE_RATE: u32 = 8000;

/// Default channel count (mono)
pub const DEFAULT_CHANNEL_COUNT: u16 = 1;

/// Default maximum session length
pub const DEFAULT_MAX_DURATION: &str = "20m";

/// Default encoder output type
pub const DEFAULT_MIME_TYPE: &str = "audio/webm;codecs=opus";

/// Default feedback service base URL
pub const DEFAULT_BASE_URL: &str = "https://vbtbb826n2.execute-api.us-east-1.amazonaws.com/prod";

/// Default process-recording endpoint path
pub const DEFAULT_PROCESS_RECORDING_PATH: &str = "/process-recording";

/// Sample rates the Opus encoder accepts
pub const SUPPORTED_SAMPLE_RATES: &[u32] = &[8000, 12000, 16000, 24000, 48000];

/// Audio capture section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: Option<u32>,
    pub channel_count: Option<u16>,
    pub echo_cancellation: Option<bool>,
    pub noise_suppression: Option<bool>,
    pub auto_gain_control: Option<bool>,
    pub max_duration: Option<String>,
    pub mime_type: Option<String>,
}

/// Feedback service section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub process_recording_path: Option<String>,
}

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub play_feedback: Option<bool>,
    pub audio: Option<AudioConfig>,
    pub api: Option<ApiConfig>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            play_feedback: Some(false),
            audio: Some(AudioConfig {
                sample_rate: Some(DEFAULT_SAMPLE_RATE),
                channel_count: Some(DEFAULT_CHANNEL_COUNT),
                echo_cancellation: Some(true),
                noise_suppression: Some(true),
                auto_gain_control: Some(true),
                max_duration: Some(DEFAULT_MAX_DURATION.to_string()),
                mime_type: Some(DEFAULT_MIME_TYPE.to_string()),
            }),
            api: Some(ApiConfig {
                base_url: Some(DEFAULT_BASE_URL.to_string()),
                process_recording_path: Some(DEFAULT_PROCESS_RECORDING_PATH.to_string()),
            }),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            play_feedback: other.play_feedback.or(self.play_feedback),
            audio: Self::merge_audio(self.audio, other.audio),
            api: Self::merge_api(self.api, other.api),
        }
    }

    fn merge_audio(base: Option<AudioConfig>, other: Option<AudioConfig>) -> Option<AudioConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(AudioConfig {
                sample_rate: o.sample_rate.or(b.sample_rate),
                channel_count: o.channel_count.or(b.channel_count),
                echo_cancellation: o.echo_cancellation.or(b.echo_cancellation),
                noise_suppression: o.noise_suppression.or(b.noise_suppression),
                auto_gain_control: o.auto_gain_control.or(b.auto_gain_control),
                max_duration: o.max_duration.or(b.max_duration),
                mime_type: o.mime_type.or(b.mime_type),
            }),
        }
    }

    fn merge_api(base: Option<ApiConfig>, other: Option<ApiConfig>) -> Option<ApiConfig> {
        match (base, other) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (Some(b), Some(o)) => Some(ApiConfig {
                base_url: o.base_url.or(b.base_url),
                process_recording_path: o.process_recording_path.or(b.process_recording_path),
            }),
        }
    }

    /// Mutable access to the audio section, creating it if missing
    pub fn audio_mut(&mut self) -> &mut AudioConfig {
        self.audio.get_or_insert_with(AudioConfig::default)
    }

    /// Mutable access to the api section, creating it if missing
    pub fn api_mut(&mut self) -> &mut ApiConfig {
        self.api.get_or_insert_with(ApiConfig::default)
    }

    /// Resolve into validated, immutable settings.
    ///
    /// Missing values fall back to the compiled-in defaults; present but
    /// invalid values are an error.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        let audio = self.audio.clone().unwrap_or_default();
        let api = self.api.clone().unwrap_or_default();

        let sample_rate = audio.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        validate_sample_rate(sample_rate)?;

        let channel_count = audio.channel_count.unwrap_or(DEFAULT_CHANNEL_COUNT);
        validate_channel_count(channel_count)?;

        let max_duration = match audio.max_duration.as_deref() {
            Some(s) => s
                .parse::<Duration>()
                .map_err(|e| ConfigError::invalid("audio.max_duration", e.to_string()))?,
            None => Duration::default_max_duration(),
        };

        let mime_type = audio
            .mime_type
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());
        if mime_type.trim().is_empty() {
            return Err(ConfigError::invalid("audio.mime_type", "must not be empty"));
        }

        let base_url = parse_base_url(
            api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        )?;

        let process_recording_path = api
            .process_recording_path
            .unwrap_or_else(|| DEFAULT_PROCESS_RECORDING_PATH.to_string());
        validate_path(&process_recording_path)?;

        Ok(Settings {
            audio: AudioSettings {
                constraints: AudioConstraints {
                    sample_rate,
                    channel_count,
                    echo_cancellation: audio.echo_cancellation.unwrap_or(true),
                    noise_suppression: audio.noise_suppression.unwrap_or(true),
                    auto_gain_control: audio.auto_gain_control.unwrap_or(true),
                },
                mime_type,
            },
            max_duration,
            api: ApiSettings {
                base_url,
                process_recording_path,
            },
            play_feedback: self.play_feedback.unwrap_or(false),
        })
    }
}

/// Check a sample rate against the Opus-supported set
pub fn validate_sample_rate(rate: u32) -> Result<(), ConfigError> {
    if SUPPORTED_SAMPLE_RATES.contains(&rate) {
        Ok(())
    } else {
        let valid: Vec<String> = SUPPORTED_SAMPLE_RATES.iter().map(|r| r.to_string()).collect();
        Err(ConfigError::invalid(
            "audio.sample_rate",
            format!("{} Hz is not supported. Valid rates: {}", rate, valid.join(", ")),
        ))
    }
}

/// Channel count must be mono or stereo
pub fn validate_channel_count(count: u16) -> Result<(), ConfigError> {
    if count == 1 || count == 2 {
        Ok(())
    } else {
        Err(ConfigError::invalid("audio.channel_count", "must be 1 or 2"))
    }
}

/// Parse a base URL: absolute http(s), a host, no query or fragment
pub fn parse_base_url(url: &str) -> Result<Url, ConfigError> {
    let parsed =
        Url::parse(url).map_err(|e| ConfigError::invalid("api.base_url", e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::invalid(
            "api.base_url",
            "must start with http:// or https://",
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::invalid("api.base_url", "must include a host"));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ConfigError::invalid(
            "api.base_url",
            "must not carry a query string or fragment",
        ));
    }
    Ok(parsed)
}

/// Base URL must be absolute http(s) with a host
pub fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    parse_base_url(url).map(|_| ())
}

/// Endpoint path must be absolute
pub fn validate_path(path: &str) -> Result<(), ConfigError> {
    if path.starts_with('/') && !path.contains(char::is_whitespace) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "api.process_recording_path",
            "must start with '/' and contain no whitespace",
        ))
    }
}
