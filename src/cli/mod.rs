//! CLI layer - Command-line interface
//!
//! Contains argument parsing, output formatting, keyboard controls,
//! logging setup and the session runners.

pub mod app;
pub mod args;
pub mod config_cmd;
pub mod controls;
pub mod logging;
pub mod presenter;

// Re-export commonly used types
pub use app::{
    drive_session, run_interactive, run_oneshot, OutputOptions, SessionSummary, EXIT_ERROR,
    EXIT_SUCCESS, EXIT_USAGE_ERROR,
};
pub use args::{Cli, Commands, ConfigAction};
pub use controls::{ControlHandler, ControlSignal};
pub use presenter::Presenter;
