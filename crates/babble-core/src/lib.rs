//! Babble Core Library
//!
//! Live microphone capture with a recording lifecycle, real-time waveform
//! energy and WAV packaging, built on CPAL, realfft and hound.
//!
//! # Example
//!
//! ```no_run
//! use babble_core::{CoreResult, CpalInput, Recorder, RecorderConfig};
//!
//! use std::{path::Path, sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let recorder = Recorder::new(Arc::new(CpalInput::default()), RecorderConfig::default())?;
//!     let mut frames = recorder.frames();
//!
//!     recorder.start();
//!     tokio::time::sleep(Duration::from_secs(5)).await;
//!     println!("level: {}", frames.borrow_and_update().level());
//!
//!     recorder.stop()?;
//!     recorder.download(Path::new("."))?;
//!     Ok(())
//! }
//! ```

mod artifact;
mod audio;
mod error;
mod recorder;

pub use {
    artifact::{FILE_NAME, MIME_TYPE, ObjectUrls, RecordingArtifact},
    audio::{
        AnalysisNode, Analyser, AnalyserInput, AudioChunk, BYTES_PER_SAMPLE, CaptureSession,
        ChunkEncoder, CpalInput, DEFAULT_FREQUENCY_SCALE, EnergySample, InputDevice, InputStream,
        MAX_FFT_SIZE, MIN_FFT_SIZE, SampleCallback, SignalSampler, TIME_DOMAIN_MIDPOINT,
    },
    error::{CoreError, Result as CoreResult},
    recorder::{
        AnimationLoop, DEFAULT_BASELINE_LEVEL, DEFAULT_COUNTDOWN_SECONDS, DEFAULT_FFT_SIZE,
        DEFAULT_FRAME_RATE, DEFAULT_TIMESLICE_MS, Recorder, RecorderConfig, RecorderEvent,
        RecordingState, RecordingStateMachine, SessionStats, Transition, WaveformFrame,
        WaveformMode,
    },
};

#[cfg(test)]
mod tests;
