mod animation;
mod countdown;
mod manager;
mod recorder_config;
mod recorder_event;
mod recording_state;
mod state_machine;
mod waveform;

pub(crate) use countdown::{COUNTDOWN_PERIOD, Countdown};

pub use {
    animation::AnimationLoop,
    manager::{Recorder, SessionStats},
    recorder_config::{
        DEFAULT_BASELINE_LEVEL, DEFAULT_COUNTDOWN_SECONDS, DEFAULT_FFT_SIZE, DEFAULT_FRAME_RATE,
        DEFAULT_TIMESLICE_MS, RecorderConfig,
    },
    recorder_event::RecorderEvent,
    recording_state::RecordingState,
    state_machine::{RecordingStateMachine, Transition},
    waveform::{WaveformFrame, WaveformMode},
};
