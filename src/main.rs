//! Presentation Practice CLI entry point

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use presentation_practice::cli::{
    app::{load_merged_config, run_interactive, run_oneshot, split_endpoint, OutputOptions},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    logging,
    presenter::Presenter,
    EXIT_ERROR, EXIT_USAGE_ERROR,
};
use presentation_practice::domain::config::{AppConfig, AudioConfig};
use presentation_practice::domain::recording::Duration;
use presentation_practice::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let presenter = Presenter::new();

    if let Some(Commands::Config { action }) = cli.command {
        let store = XdgConfigStore::new();
        if let Err(e) = handle_config_command(action, &store, &presenter).await {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
        return ExitCode::SUCCESS;
    }

    // Usage errors are reported before any config file is read
    let duration = match cli.duration.as_deref().map(str::parse::<Duration>) {
        Some(Ok(d)) => Some(d),
        Some(Err(e)) => {
            presenter.error(&format!("Invalid duration: {}", e));
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        None => None,
    };

    if let Some(Err(e)) = cli.max_duration.as_deref().map(str::parse::<Duration>) {
        presenter.error(&format!("Invalid max-duration: {}", e));
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let api = match cli.endpoint.as_deref() {
        Some(endpoint) => match split_endpoint(endpoint) {
            Ok(api) => Some(api),
            Err(e) => {
                presenter.error(&format!("Invalid endpoint: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => None,
    };

    let cli_config = AppConfig {
        play_feedback: if cli.play { Some(true) } else { None },
        audio: cli.max_duration.clone().map(|max| AudioConfig {
            max_duration: Some(max),
            ..Default::default()
        }),
        api,
    };

    let config = match load_merged_config(cli_config).await {
        Ok(config) => config,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let settings = match config.resolve() {
        Ok(settings) => Arc::new(settings),
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let output = OutputOptions {
        json: cli.json,
        autoplay: settings.play_feedback,
    };

    match duration {
        Some(duration) => run_oneshot(settings, duration, output).await,
        None => run_interactive(settings, output).await,
    }
}
