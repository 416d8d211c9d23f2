//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

/// Presentation Practice - record a talk and get speaking feedback
#[derive(Parser, Debug)]
#[command(name = "presentation-practice")]
#[command(version)]
#[command(about = "Record a presentation from the microphone and get AI-powered speaking feedback")]
#[command(long_about = None)]
pub struct Cli {
    /// Record once for this long, print the report and exit (e.g., 90s, 5m, 2m30s)
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Maximum session length before recording stops on its own
    #[arg(long, value_name = "TIME")]
    pub max_duration: Option<String>,

    /// Full URL of the process-recording endpoint
    #[arg(long, value_name = "URL", env = "PRESENTATION_PRACTICE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Play the spoken feedback as soon as a report arrives
    #[arg(short = 'p', long)]
    pub play: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Config subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "audio.sample_rate",
    "audio.channel_count",
    "audio.echo_cancellation",
    "audio.noise_suppression",
    "audio.auto_gain_control",
    "audio.max_duration",
    "audio.mime_type",
    "api.base_url",
    "api.process_recording_path",
    "play_feedback",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
