use std::fmt;

/// Recording lifecycle state. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    /// Nothing captured, ready to start.
    #[default]
    Idle,
    /// Counting down before capture begins. Always greater than zero.
    CountingDown(u32),
    /// Capturing audio and publishing waveform frames.
    Recording,
    /// Session open, encoder and waveform frozen.
    Paused,
    /// Session finalized; an artifact may be available.
    Stopped,
}

impl RecordingState {
    /// Whether a capture session is expected to be open.
    pub fn has_session(&self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Paused)
    }

    /// Whether the animation loop may read the analysis node.
    pub fn is_sampling(&self) -> bool {
        matches!(self, RecordingState::Recording)
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::CountingDown(n) => write!(f, "counting down ({n})"),
            RecordingState::Recording => write!(f, "recording"),
            RecordingState::Paused => write!(f, "paused"),
            RecordingState::Stopped => write!(f, "stopped"),
        }
    }
}
