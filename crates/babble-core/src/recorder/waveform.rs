use crate::audio::EnergySample;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Which scalar the renderer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WaveformMode {
    /// Mean time-domain byte value.
    #[default]
    Amplitude,
    /// Scaled mean spectral magnitude.
    Frequency,
}

impl WaveformMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            WaveformMode::Amplitude => WaveformMode::Frequency,
            WaveformMode::Frequency => WaveformMode::Amplitude,
        }
    }
}

impl fmt::Display for WaveformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveformMode::Amplitude => write!(f, "Amplitude"),
            WaveformMode::Frequency => write!(f, "Frequency"),
        }
    }
}

impl FromStr for WaveformMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amplitude" | "amp" | "a" => Ok(WaveformMode::Amplitude),
            "frequency" | "freq" | "f" => Ok(WaveformMode::Frequency),
            other => Err(format!("unknown waveform mode '{}'", other)),
        }
    }
}

/// Value handed to the renderer once per animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformFrame {
    /// Time-domain amplitude.
    pub time_domain: f32,
    /// Frequency-domain amplitude.
    pub frequency_domain: f32,
    /// Scalar the renderer should draw.
    pub mode: WaveformMode,
}

impl WaveformFrame {
    /// Frame shown before anything has been sampled.
    pub fn baseline(level: f32, mode: WaveformMode) -> Self {
        Self {
            time_domain: level,
            frequency_domain: level,
            mode,
        }
    }

    /// Frame built from a fresh energy sample.
    pub fn from_energy(energy: EnergySample, mode: WaveformMode) -> Self {
        Self {
            time_domain: energy.time_domain,
            frequency_domain: energy.frequency_domain,
            mode,
        }
    }

    /// The scalar selected by `mode`.
    pub fn level(&self) -> f32 {
        match self.mode {
            WaveformMode::Amplitude => self.time_domain,
            WaveformMode::Frequency => self.frequency_domain,
        }
    }
}
