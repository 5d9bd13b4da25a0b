//! Line-based command input.
//!
//! Reads commands from stdin on a blocking thread and forwards them to the
//! main application over an async channel.

use crate::{AppCommand, AppError, AppResult, app_command::HELP};

use std::{io::BufRead, panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Forwards parsed stdin lines as [`AppCommand`]s.
pub struct CommandReader {
    command_tx: mpsc::Sender<AppCommand>,
}

impl CommandReader {
    /// Create a reader that sends to `command_tx`.
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run until shutdown is signalled or stdin closes.
    ///
    /// End of input is treated as a quit request.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(32);

        // Stdin has no async close; the forwarder ends on EOF or when
        // line_rx is dropped and the next blocking_send fails.
        let handle = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Command reader shutting down");
                    break;
                }
                line = line_rx.recv() => {
                    let Some(line) = line else {
                        info!("Input closed, requesting shutdown");
                        self.send(AppCommand::Shutdown).await?;
                        break;
                    };
                    self.handle_line(&line).await?;
                }
            }
        }

        drop(line_rx);

        match tokio::time::timeout(Duration::from_millis(100), handle).await {
            Ok(Ok(())) => debug!("Stdin forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Stdin forwarder task panicked"),
            Err(_) => debug!("Stdin forwarder still blocked on input, will be cleaned up on exit"),
        }

        Ok(())
    }

    /// Parse one line and forward it. Blank lines are skipped; unknown
    /// commands print the help text.
    #[instrument(skip(self))]
    pub(crate) async fn handle_line(&self, line: &str) -> AppResult<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        match line.parse::<AppCommand>() {
            Ok(command) => self.send(command).await,
            Err(reason) => {
                warn!(line, reason = %reason, "Unrecognized command");
                eprintln!("{}\n{}", reason, HELP);
                Ok(())
            }
        }
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send command: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
