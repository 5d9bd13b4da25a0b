//! Babble: terminal voice recorder with a live waveform meter.

mod app;
mod app_command;
mod command_reader;
mod config;
mod error;
mod terminal_renderer;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    command_reader::CommandReader,
    error::{AppError, Result as AppResult},
    terminal_renderer::TerminalRenderer,
};

use crate::config::Config;

use std::{sync::Arc, time::Duration};

use babble_core::{CpalInput, Recorder};
use tokio::sync::{mpsc, watch};
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "babble=info,babble_core=info";
const STDIN_SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

/// Application entry point.
fn main() {
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(run());

    // The stdin forwarder may still be blocked in read(); do not wait for it.
    rt.shutdown_timeout(STDIN_SHUTDOWN_GRACE);
}

async fn run() {
    let config_path = match Config::default_path() {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to locate config: {:?}", e);
            std::process::exit(1);
        }
    };

    let config = match Config::load_from(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let input = Arc::new(CpalInput::new(config.audio.selected_device.clone()));
    let recorder = match Recorder::new(input, config.recorder_config()) {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to create Recorder: {:?}", e);
            std::process::exit(1);
        }
    };

    let (command_tx, command_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let command_reader = CommandReader::new(command_tx);

    let app = App {
        recorder,
        renderer: TerminalRenderer::stdout().with_frequency_scale(config.visual.frequency_scale),
        config,
        config_path,
        command_rx,
        shutdown_tx,
    };

    tokio::join!(
        async {
            if let Err(e) = command_reader.run(shutdown_rx).await {
                error!(error = ?e, "Command reader error");
            }
        },
        async {
            if let Err(e) = app.run().await {
                error!(error = ?e, "App error");
            }
        }
    );
}

/// Logs go to stderr so the meter on stdout stays readable. `RUST_LOG`
/// overrides the filter; `BABBLE_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("BABBLE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
