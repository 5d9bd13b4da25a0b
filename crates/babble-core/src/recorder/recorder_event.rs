use crate::RecordingState;

/// Lifecycle notifications for UI consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// The state machine moved to a new state.
    StateChanged(RecordingState),
    /// A recording was packaged and can be downloaded.
    ArtifactReady {
        /// Resolvable URL of the artifact.
        url: String,
        /// Container size in bytes.
        bytes: usize,
    },
    /// An artifact URL was revoked.
    ArtifactReleased {
        /// The revoked URL.
        url: String,
    },
    /// A non-fatal problem the user should see, such as a denied microphone.
    Notice(String),
}
