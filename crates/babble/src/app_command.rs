use babble_core::WaveformMode;

use std::str::FromStr;

/// Commands sent from the command reader to the main application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Begin the countdown.
    Start,
    /// Two-step finish: pause a running recording, stop a paused one.
    Done,
    /// Pause when recording, resume when paused.
    TogglePause,
    /// Finalize the recording.
    Stop,
    /// Discard the recording and return to idle.
    Delete,
    /// Save the finished recording to the download directory.
    Download,
    /// Select the meter mode, or switch it when `None`.
    Mode(Option<WaveformMode>),
    /// Print the command list.
    Help,
    /// Request application shutdown.
    Shutdown,
}

impl FromStr for AppCommand {
    type Err = String;

    /// Parse one line of user input. Single-letter shortcuts are accepted.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" | "s" => AppCommand::Start,
            "done" | "d" => AppCommand::Done,
            "pause" | "resume" | "p" => AppCommand::TogglePause,
            "stop" | "x" => AppCommand::Stop,
            "delete" | "reset" | "del" => AppCommand::Delete,
            "download" | "save" | "w" => AppCommand::Download,
            "mode" | "m" => match words.next() {
                Some(mode) => AppCommand::Mode(Some(mode.parse()?)),
                None => AppCommand::Mode(None),
            },
            "help" | "h" | "?" => AppCommand::Help,
            "quit" | "exit" | "q" => AppCommand::Shutdown,
            other => return Err(format!("unknown command '{}'", other)),
        };

        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument '{}'", extra));
        }

        Ok(command)
    }
}

/// Command list printed by `help`.
pub const HELP: &str = "\
commands:
  start (s)           count down, then record
  done (d)            pause a recording, stop a paused one
  pause | resume (p)  toggle pause
  stop (x)            finish the recording
  delete (del)        discard the recording
  download (w)        save audio.wav
  mode [amp|freq] (m) switch the meter
  quit (q)            exit";
