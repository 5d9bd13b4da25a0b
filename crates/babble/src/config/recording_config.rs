use crate::config::{default_countdown_seconds, default_timeslice_ms};

use serde::{Deserialize, Serialize};

/// Recording lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Seconds counted down before capture begins.
    #[serde(default = "default_countdown_seconds")]
    pub countdown_seconds: u32,
    /// Milliseconds of audio per encoded chunk.
    #[serde(default = "default_timeslice_ms")]
    pub timeslice_ms: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: default_countdown_seconds(),
            timeslice_ms: default_timeslice_ms(),
        }
    }
}
