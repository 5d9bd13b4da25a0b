use crate::{AppCommand, AppResult, TerminalRenderer, app_command::HELP, config::Config};

use std::{io::Write, path::PathBuf};

use babble_core::{CoreResult, Recorder, RecorderEvent, Transition};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, instrument, warn};

/// Main application state.
///
/// Owns the recorder and the renderer. Commands arrive from the
/// [`crate::CommandReader`]; frames, state changes and events arrive from
/// the recorder's channels.
pub struct App<W: Write> {
    pub(crate) recorder: Recorder,
    pub(crate) renderer: TerminalRenderer<W>,
    pub(crate) config: Config,
    pub(crate) config_path: PathBuf,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl<W: Write> App<W> {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Babble starting");

        let mut states = self.recorder.subscribe_state();
        let mut frames = self.recorder.frames();
        let mut events = self.recorder.events();

        if let Err(e) = self.renderer.state(*states.borrow_and_update()) {
            error!(error = ?e, "Failed to render state");
        }

        loop {
            tokio::select! {
                Some(cmd) = self.command_rx.recv() => {
                    if cmd == AppCommand::Shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                    if let Err(e) = self.handle_command(cmd) {
                        error!(error = ?e, "Failed to handle command");
                    }
                }

                Ok(()) = states.changed() => {
                    let state = *states.borrow_and_update();
                    if let Err(e) = self.renderer.state(state) {
                        error!(error = ?e, "Failed to render state");
                    }
                }

                Ok(()) = frames.changed() => {
                    let frame = *frames.borrow_and_update();
                    if let Err(e) = self.renderer.frame(&frame, self.recorder.state()) {
                        error!(error = ?e, "Failed to render frame");
                    }
                }

                event = events.recv() => match event {
                    Ok(event) => {
                        if let Err(e) = self.handle_event(event) {
                            error!(error = ?e, "Failed to handle recorder event");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Recorder events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Recorder event channel closed, shutting down");
                        break;
                    }
                },

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.recorder.shutdown();
        let _ = self.shutdown_tx.send(true);
        info!("Babble shut down successfully");

        Ok(())
    }

    /// Apply one user command to the recorder.
    ///
    /// Recorder errors are reported to the user and logged; only renderer and
    /// config failures are returned.
    #[instrument(skip(self))]
    pub(crate) fn handle_command(&mut self, cmd: AppCommand) -> AppResult<()> {
        match cmd {
            AppCommand::Start => {
                if self.recorder.start() == Transition::Ignored {
                    self.renderer.line("Already started.")?;
                }
            }
            AppCommand::Done => {
                let result = self.recorder.done();
                self.report(result)?;
            }
            AppCommand::TogglePause => {
                let result = self.recorder.toggle_pause();
                self.report(result)?;
            }
            AppCommand::Stop => {
                let result = self.recorder.stop();
                self.report(result)?;
            }
            AppCommand::Delete => {
                self.recorder.delete();
            }
            AppCommand::Download => {
                match self.recorder.download(&self.config.output.download_dir) {
                    Ok(path) => self.renderer.line(&format!("Saved {}", path.display()))?,
                    Err(e) => {
                        warn!(error = %e, "Download failed");
                        self.renderer.line("Nothing to download yet.")?;
                    }
                }
            }
            AppCommand::Mode(mode) => {
                let mode = match mode {
                    Some(mode) => {
                        self.recorder.set_mode(mode);
                        mode
                    }
                    None => self.recorder.toggle_mode(),
                };
                self.renderer.line(&format!("Meter: {}", mode))?;

                self.config.visual.mode = mode;
                if let Err(e) = self.config.save_to(&self.config_path) {
                    warn!(error = ?e, "Failed to persist meter mode");
                }
            }
            AppCommand::Help => self.renderer.line(HELP)?,
            AppCommand::Shutdown => {}
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn handle_event(&mut self, event: RecorderEvent) -> AppResult<()> {
        match event {
            RecorderEvent::StateChanged(state) => debug!(state = %state, "State event"),
            RecorderEvent::ArtifactReady { url, bytes } => {
                self.renderer
                    .line(&format!("Recording ready: {} ({} bytes)", url, bytes))?;
            }
            RecorderEvent::ArtifactReleased { url } => {
                self.renderer.line(&format!("Recording discarded: {}", url))?;
            }
            RecorderEvent::Notice(text) => self.renderer.line(&text)?,
        }
        Ok(())
    }

    fn report(&mut self, result: CoreResult<Transition>) -> AppResult<()> {
        if let Err(e) = result {
            warn!(error = %e, "Command rejected");
            self.renderer.line("Not available right now.")?;
        }
        Ok(())
    }
}
