use crate::{
    CoreError, CoreResult, WaveformMode,
    audio::{DEFAULT_FREQUENCY_SCALE, validate_fft_size},
};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Seconds counted down before capture begins.
pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 3;
/// Analysis window in samples.
pub const DEFAULT_FFT_SIZE: usize = 2048;
/// Animation frames per second.
pub const DEFAULT_FRAME_RATE: u32 = 60;
/// Milliseconds of audio per encoded chunk.
pub const DEFAULT_TIMESLICE_MS: u64 = 1000;
/// Level published before the first sample.
pub const DEFAULT_BASELINE_LEVEL: f32 = 40.0;

const MAX_FRAME_RATE: u32 = 240;

/// Tunables for the capture and analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Countdown length in seconds. Must be positive.
    pub countdown_seconds: u32,
    /// Analysis window; a power of two between 32 and 32768.
    pub fft_size: usize,
    /// Multiplier applied to the mean spectral byte value.
    pub frequency_scale: f32,
    /// Animation loop cadence in frames per second.
    pub frame_rate: u32,
    /// Audio duration per encoded chunk, in milliseconds. Zero emits a
    /// single chunk per pause or stop.
    pub timeslice_ms: u64,
    /// Weight of the previous spectrum when smoothing, in `0.0..=1.0`.
    pub smoothing_time_constant: f32,
    /// Spectral magnitude mapped to byte 0.
    pub min_decibels: f32,
    /// Spectral magnitude mapped to byte 255.
    pub max_decibels: f32,
    /// Level of the frame published before any sampling.
    pub baseline_level: f32,
    /// Initial renderer mode.
    pub mode: WaveformMode,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            fft_size: DEFAULT_FFT_SIZE,
            frequency_scale: DEFAULT_FREQUENCY_SCALE,
            frame_rate: DEFAULT_FRAME_RATE,
            timeslice_ms: DEFAULT_TIMESLICE_MS,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            baseline_level: DEFAULT_BASELINE_LEVEL,
            mode: WaveformMode::Amplitude,
        }
    }
}

impl RecorderConfig {
    /// Check every field before a recorder is built.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        validate_fft_size(self.fft_size)?;

        let problem = if self.countdown_seconds == 0 {
            Some("countdown_seconds must be greater than zero".to_string())
        } else if self.frame_rate == 0 || self.frame_rate > MAX_FRAME_RATE {
            Some(format!(
                "frame_rate must be between 1 and {}, got {}",
                MAX_FRAME_RATE, self.frame_rate
            ))
        } else if !self.frequency_scale.is_finite() || self.frequency_scale < 0.0 {
            Some(format!(
                "frequency_scale must be a non-negative number, got {}",
                self.frequency_scale
            ))
        } else if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            Some(format!(
                "smoothing_time_constant must be within 0..=1, got {}",
                self.smoothing_time_constant
            ))
        } else if !self.min_decibels.is_finite()
            || !self.max_decibels.is_finite()
            || self.min_decibels >= self.max_decibels
        {
            Some(format!(
                "min_decibels ({}) must be a finite value below max_decibels ({})",
                self.min_decibels, self.max_decibels
            ))
        } else {
            None
        };

        match problem {
            Some(reason) => Err(CoreError::InvalidConfig {
                reason,
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(()),
        }
    }

    /// Time between animation frames.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.frame_rate.max(1)))
    }
}
