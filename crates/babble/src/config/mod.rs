mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod output_config;
mod recording_config;
mod visual_config;

pub(crate) use {
    audio_config::AudioConfig, config::Config, output_config::OutputConfig,
    recording_config::RecordingConfig, visual_config::VisualConfig,
};

use std::path::PathBuf;

use babble_core::{
    DEFAULT_COUNTDOWN_SECONDS, DEFAULT_FFT_SIZE, DEFAULT_FREQUENCY_SCALE, DEFAULT_FRAME_RATE,
    DEFAULT_TIMESLICE_MS,
};
use directories::UserDirs;

pub(crate) fn default_countdown_seconds() -> u32 {
    DEFAULT_COUNTDOWN_SECONDS
}

pub(crate) fn default_timeslice_ms() -> u64 {
    DEFAULT_TIMESLICE_MS
}

pub(crate) fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

pub(crate) fn default_fft_size() -> usize {
    DEFAULT_FFT_SIZE
}

pub(crate) fn default_frequency_scale() -> f32 {
    DEFAULT_FREQUENCY_SCALE
}

/// The user's downloads directory, or the working directory when the
/// platform has none.
pub(crate) fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}
