//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::{
    validate_base_url, validate_channel_count, validate_path, validate_sample_rate, AppConfig,
};
use crate::domain::error::ConfigError;
use crate::domain::recording::Duration;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    ensure_known_key(key)?;

    let config = store.load().await?;
    match read_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = read_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn ensure_known_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            key,
            format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
        ))
    }
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "audio.sample_rate" => {
            let rate = parse_number::<u32>(key, value)?;
            validate_sample_rate(rate)?;
            config.audio_mut().sample_rate = Some(rate);
        }
        "audio.channel_count" => {
            let count = parse_number::<u16>(key, value)?;
            validate_channel_count(count)?;
            config.audio_mut().channel_count = Some(count);
        }
        "audio.echo_cancellation" => {
            config.audio_mut().echo_cancellation = Some(parse_flag(key, value)?)
        }
        "audio.noise_suppression" => {
            config.audio_mut().noise_suppression = Some(parse_flag(key, value)?)
        }
        "audio.auto_gain_control" => {
            config.audio_mut().auto_gain_control = Some(parse_flag(key, value)?)
        }
        "audio.max_duration" => {
            value
                .parse::<Duration>()
                .map_err(|e| ConfigError::invalid(key, e.to_string()))?;
            config.audio_mut().max_duration = Some(value.to_string());
        }
        "audio.mime_type" => {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(key, "must not be empty"));
            }
            config.audio_mut().mime_type = Some(value.to_string());
        }
        "api.base_url" => {
            validate_base_url(value)?;
            config.api_mut().base_url = Some(value.to_string());
        }
        "api.process_recording_path" => {
            validate_path(value)?;
            config.api_mut().process_recording_path = Some(value.to_string());
        }
        "play_feedback" => config.play_feedback = Some(parse_flag(key, value)?),
        _ => return ensure_known_key(key),
    }
    Ok(())
}

/// Current value of `key` rendered as text
fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    let audio = config.audio.as_ref();
    let api = config.api.as_ref();

    match key {
        "audio.sample_rate" => audio.and_then(|a| a.sample_rate).map(|v| v.to_string()),
        "audio.channel_count" => audio.and_then(|a| a.channel_count).map(|v| v.to_string()),
        "audio.echo_cancellation" => audio
            .and_then(|a| a.echo_cancellation)
            .map(|b| b.to_string()),
        "audio.noise_suppression" => audio
            .and_then(|a| a.noise_suppression)
            .map(|b| b.to_string()),
        "audio.auto_gain_control" => audio
            .and_then(|a| a.auto_gain_control)
            .map(|b| b.to_string()),
        "audio.max_duration" => audio.and_then(|a| a.max_duration.clone()),
        "audio.mime_type" => audio.and_then(|a| a.mime_type.clone()),
        "api.base_url" => api.and_then(|a| a.base_url.clone()),
        "api.process_recording_path" => api.and_then(|a| a.process_recording_path.clone()),
        "play_feedback" => config.play_feedback.map(|b| b.to_string()),
        _ => None,
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a number", value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).map_err(|_| ConfigError::invalid(key, "Value must be 'true' or 'false'"))
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}
