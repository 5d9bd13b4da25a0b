use crate::config::{default_fft_size, default_frame_rate, default_frequency_scale};

use babble_core::WaveformMode;
use serde::{Deserialize, Serialize};

/// Waveform meter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConfig {
    /// Scalar the meter draws at launch.
    #[serde(default)]
    pub mode: WaveformMode,
    /// Frames sampled per second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Analysis window in samples.
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Multiplier applied to the mean spectral value.
    #[serde(default = "default_frequency_scale")]
    pub frequency_scale: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            mode: WaveformMode::default(),
            frame_rate: default_frame_rate(),
            fft_size: default_fft_size(),
            frequency_scale: default_frequency_scale(),
        }
    }
}
