//! One recording attempt: input stream, encoder and analysis node.
//!
//! A session is opened when the countdown ends and disposed on stop or
//! reset. It is never reused; the next attempt opens a new one with a new
//! generation number.

use crate::{
    CoreError, CoreResult, RecorderConfig, RecordingState,
    artifact::{ObjectUrls, RecordingArtifact},
    audio::{Analyser, ChunkEncoder, InputDevice, InputStream},
};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Live capture session.
pub struct CaptureSession {
    id: Uuid,
    generation: u64,
    stream: Option<Box<dyn InputStream>>,
    encoder: ChunkEncoder,
    analyser: Analyser,
    sample_rate: u32,
    finalized: bool,
    disposed: bool,
}

impl CaptureSession {
    /// Open the input device and wire it into a fresh encoder and analyser.
    ///
    /// `gate` is the state machine's watch channel; the encoder only writes
    /// while it reads `Recording`.
    ///
    /// # Errors
    ///
    /// [`CoreError::DeviceAccess`] if the microphone cannot be opened,
    /// [`CoreError::InvalidConfig`] if the analysis window is rejected.
    #[track_caller]
    #[instrument(skip(input, config, gate))]
    pub fn open(
        input: &dyn InputDevice,
        config: &RecorderConfig,
        gate: watch::Receiver<RecordingState>,
        generation: u64,
    ) -> CoreResult<Self> {
        let (analyser, analyser_input) = Analyser::new(config)?;
        let encoder = ChunkEncoder::new(gate);

        let callback_encoder = encoder.clone();
        let stream = input.open(Box::new(move |data: &[f32]| {
            analyser_input.push(data);
            callback_encoder.encode(data);
        }))?;

        let sample_rate = stream.sample_rate();
        encoder.set_timeslice(sample_rate, config.timeslice_ms);

        let id = Uuid::new_v4();
        info!(session_id = %id, generation, sample_rate, "Capture session opened");

        Ok(Self {
            id,
            generation,
            stream: Some(stream),
            encoder,
            analyser,
            sample_rate,
            finalized: false,
            disposed: false,
        })
    }

    /// Session id for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Generation this session was opened for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sample rate of the captured stream.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Chunks emitted so far.
    pub fn chunk_count(&self) -> usize {
        self.encoder.chunk_count()
    }

    /// Whether [`CaptureSession::dispose`] has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// The analysis node bound to this session's stream.
    pub fn analyser(&self) -> &Analyser {
        &self.analyser
    }

    /// Mutable access for sampling. Fails once disposed.
    #[track_caller]
    pub fn analyser_mut(&mut self) -> CoreResult<&mut Analyser> {
        if self.disposed {
            return Err(CoreError::StaleHandle {
                resource: "analysis node",
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(&mut self.analyser)
    }

    /// Stop encoding and cut the pending chunk.
    ///
    /// The stream keeps flowing; the analyser still sees every buffer.
    #[track_caller]
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn pause(&mut self) -> CoreResult<()> {
        self.ensure_writable("pause")?;
        let flushed = self.encoder.pause();
        debug!(flushed, chunk_count = self.encoder.chunk_count(), "Encoder paused");
        Ok(())
    }

    /// Counterpart of [`CaptureSession::pause`]. Encoding resumes once the
    /// state machine also reads `Recording`.
    #[track_caller]
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn resume(&mut self) -> CoreResult<()> {
        self.ensure_writable("resume")?;
        self.encoder.resume();
        debug!("Encoder resumed");
        Ok(())
    }

    /// Close the encoder and package every chunk into an artifact.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidState`] on a second call or after dispose;
    /// [`CoreError::Encoding`] if packaging fails.
    #[track_caller]
    #[instrument(skip(self, urls), fields(session_id = %self.id))]
    pub fn finalize(&mut self, urls: &ObjectUrls) -> CoreResult<RecordingArtifact> {
        self.ensure_writable("finalize")?;
        self.finalized = true;

        let chunks = self.encoder.close();
        let artifact = RecordingArtifact::package(chunks, self.sample_rate, urls)?;

        info!(chunk_count = artifact.chunk_count(), "Capture session finalized");

        Ok(artifact)
    }

    /// Stop the stream, detach the analyser and close the encoder.
    /// Idempotent.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        self.analyser.detach();

        if !self.finalized {
            let dropped = self.encoder.close();
            if !dropped.is_empty() {
                warn!(chunk_count = dropped.len(), "Disposed without finalize, chunks dropped");
            }
        }

        info!(generation = self.generation, "Capture session disposed");
    }

    #[track_caller]
    fn ensure_writable(&self, operation: &'static str) -> CoreResult<()> {
        let state = if self.disposed {
            "disposed"
        } else if self.finalized {
            "finalized"
        } else {
            return Ok(());
        };
        Err(CoreError::InvalidState {
            operation,
            state: format!("session {}", state),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
