//! Recording lifecycle state machine.
//!
//! Owns the only copy of [`RecordingState`]. Every transition is published on
//! a watch channel so the encoder gate and the UI observe the same value the
//! animation loop checks. Side effects (opening sessions, spawning tasks) are
//! left to the caller, driven by the returned [`Transition`].

use crate::{CoreError, CoreResult, RecordingState};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{debug, info};

/// What a state machine event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Event had no effect in the current state.
    Ignored,
    /// Countdown started or advanced; carries the remaining seconds.
    Countdown(u32),
    /// Countdown finished; capture should begin.
    BeganRecording,
    /// Recording -> Paused.
    Paused,
    /// Paused -> Recording.
    Resumed,
    /// Recording or Paused -> Stopped.
    Stopped,
    /// Returned to Idle from the given state.
    Reset(RecordingState),
}

/// Lifecycle state machine. Initial state is [`RecordingState::Idle`].
#[derive(Debug)]
pub struct RecordingStateMachine {
    state_tx: watch::Sender<RecordingState>,
    countdown_from: u32,
}

impl RecordingStateMachine {
    /// Create a machine whose countdown starts at `countdown_from` seconds.
    ///
    /// A zero countdown is clamped to one tick.
    pub fn new(countdown_from: u32) -> Self {
        let (state_tx, _) = watch::channel(RecordingState::Idle);
        Self {
            state_tx,
            countdown_from: countdown_from.max(1),
        }
    }

    /// Current state.
    pub fn state(&self) -> RecordingState {
        *self.state_tx.borrow()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<RecordingState> {
        self.state_tx.subscribe()
    }

    /// Idle -> CountingDown. Ignored in every other state.
    pub fn start(&mut self) -> Transition {
        match self.state() {
            RecordingState::Idle => {
                self.set(RecordingState::CountingDown(self.countdown_from));
                Transition::Countdown(self.countdown_from)
            }
            other => {
                debug!(state = %other, "start ignored");
                Transition::Ignored
            }
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Ticks outside the countdown (a timer firing after a reset) are ignored.
    pub fn tick(&mut self) -> Transition {
        match self.state() {
            RecordingState::CountingDown(n) if n > 1 => {
                self.set(RecordingState::CountingDown(n - 1));
                Transition::Countdown(n - 1)
            }
            RecordingState::CountingDown(_) => {
                self.set(RecordingState::Recording);
                Transition::BeganRecording
            }
            other => {
                debug!(state = %other, "countdown tick ignored");
                Transition::Ignored
            }
        }
    }

    /// Recording -> Paused.
    #[track_caller]
    pub fn pause(&mut self) -> CoreResult<Transition> {
        match self.state() {
            RecordingState::Recording => {
                self.set(RecordingState::Paused);
                Ok(Transition::Paused)
            }
            other => Err(invalid("pause", other)),
        }
    }

    /// Paused -> Recording.
    #[track_caller]
    pub fn resume(&mut self) -> CoreResult<Transition> {
        match self.state() {
            RecordingState::Paused => {
                self.set(RecordingState::Recording);
                Ok(Transition::Resumed)
            }
            other => Err(invalid("resume", other)),
        }
    }

    /// Recording or Paused -> Stopped.
    #[track_caller]
    pub fn stop(&mut self) -> CoreResult<Transition> {
        match self.state() {
            RecordingState::Recording | RecordingState::Paused => {
                self.set(RecordingState::Stopped);
                Ok(Transition::Stopped)
            }
            other => Err(invalid("stop", other)),
        }
    }

    /// Any state -> Idle. Ignored when already Idle.
    pub fn reset(&mut self) -> Transition {
        match self.state() {
            RecordingState::Idle => Transition::Ignored,
            from => {
                self.set(RecordingState::Idle);
                Transition::Reset(from)
            }
        }
    }

    fn set(&mut self, next: RecordingState) {
        let prev = self.state_tx.send_replace(next);
        info!(from = %prev, to = %next, "Recording state changed");
    }
}

#[track_caller]
fn invalid(operation: &'static str, state: RecordingState) -> CoreError {
    CoreError::InvalidState {
        operation,
        state: state.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
