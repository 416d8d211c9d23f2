//! Configuration domain module

mod app_config;
mod settings;

pub use app_config::{
    parse_base_url, validate_base_url, validate_channel_count, validate_path,
    validate_sample_rate, ApiConfig, AppConfig, AudioConfig, DEFAULT_BASE_URL,
    DEFAULT_MAX_DURATION, DEFAULT_MIME_TYPE, DEFAULT_PROCESS_RECORDING_PATH,
    DEFAULT_SAMPLE_RATE, SUPPORTED_SAMPLE_RATES,
};
pub use settings::{ApiSettings, AudioSettings, Settings};
