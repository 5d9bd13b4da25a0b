use crate::{CoreError, CoreResult, InputDevice, InputStream, SampleCallback};

use std::{
    f32::consts::PI,
    panic::Location,
    sync::{Arc, Mutex},
};

use error_location::ErrorLocation;

pub(crate) const TEST_SAMPLE_RATE: u32 = 8_000;

#[derive(Default)]
struct ScriptedState {
    callback: Option<SampleCallback>,
    opened: usize,
    denied: bool,
}

/// In-memory microphone. Tests push samples by hand.
#[derive(Clone, Default)]
pub(crate) struct ScriptedInput {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedInput {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A device whose permission prompt is always refused.
    pub(crate) fn denied() -> Self {
        let input = Self::default();
        input.state.lock().unwrap_or_else(|e| e.into_inner()).denied = true;
        input
    }

    /// Deliver samples to the open stream, if any.
    pub(crate) fn push(&self, samples: &[f32]) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(callback) = state.callback.as_mut() {
            callback(samples);
        }
    }

    /// Deliver `n` samples of a sine tone.
    pub(crate) fn push_tone(&self, frequency: f32, amplitude: f32, n: usize) {
        self.push(&tone(frequency, amplitude, n));
    }

    /// Deliver `n` zero samples.
    pub(crate) fn push_silence(&self, n: usize) {
        self.push(&vec![0.0; n]);
    }

    pub(crate) fn opened(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).opened
    }

    pub(crate) fn is_streaming(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .callback
            .is_some()
    }
}

impl InputDevice for ScriptedInput {
    #[track_caller]
    fn open(&self, callback: SampleCallback) -> CoreResult<Box<dyn InputStream>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.denied {
            return Err(CoreError::DeviceAccess {
                reason: "Permission denied".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        state.callback = Some(callback);
        state.opened += 1;
        Ok(Box::new(ScriptedStream {
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedStream {
    state: Arc<Mutex<ScriptedState>>,
}

impl InputStream for ScriptedStream {
    fn sample_rate(&self) -> u32 {
        TEST_SAMPLE_RATE
    }

    fn stop(&mut self) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).callback = None;
    }
}

pub(crate) fn tone(frequency: f32, amplitude: f32, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| amplitude * (2.0 * PI * frequency * i as f32 / TEST_SAMPLE_RATE as f32).sin())
        .collect()
}
