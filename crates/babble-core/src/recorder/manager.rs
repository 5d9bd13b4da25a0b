use crate::{
    CoreError, CoreResult, RecorderConfig, RecorderEvent, RecordingState, RecordingStateMachine,
    Transition, WaveformFrame, WaveformMode,
    artifact::{ObjectUrls, RecordingArtifact},
    audio::{CaptureSession, InputDevice, SignalSampler},
    recorder::{AnimationLoop, COUNTDOWN_PERIOD, Countdown},
};

use std::{
    panic::Location,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

const EVENT_CAPACITY: usize = 64;

/// Result of one animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FrameOutcome {
    /// A frame was sampled and published.
    Published(WaveformFrame),
    /// Sampling not permitted in the current state.
    Gated,
    /// The generation the caller serves is gone.
    Ended,
}

/// Snapshot of the open capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Session id used in logs.
    pub id: Uuid,
    /// Recording attempt the session belongs to.
    pub generation: u64,
    /// Chunks emitted so far.
    pub chunk_count: usize,
    /// Samples the stream has delivered to the analysis node.
    pub samples_seen: u64,
    /// Stream sample rate.
    pub sample_rate: u32,
}

struct RecorderInner {
    machine: RecordingStateMachine,
    session: Option<CaptureSession>,
    sampler: SignalSampler,
    artifact: Option<RecordingArtifact>,
    mode: WaveformMode,
    generation: u64,
    countdown: Option<Countdown>,
    animation: Option<AnimationLoop>,
}

pub(crate) struct Shared {
    inner: Mutex<RecorderInner>,
    input: Arc<dyn InputDevice>,
    config: RecorderConfig,
    urls: ObjectUrls,
    frames: watch::Sender<WaveformFrame>,
    events: broadcast::Sender<RecorderEvent>,
}

/// Orchestrates the recording lifecycle.
///
/// Owns the state machine, the current capture session, the sampler, the
/// artifact and both background tasks. Everything mutable sits behind one
/// lock, so a frame is never published while a session is being disposed.
///
/// # Driving
///
/// Inside a Tokio runtime the recorder spawns its own countdown and
/// animation tasks. Outside one, the host calls [`Recorder::tick`] once a
/// second during the countdown and [`Recorder::frame_tick`] once per frame.
///
/// # Thread Safety
///
/// Cheap to clone; all clones share one recorder. Background tasks hold
/// weak references and never keep it alive.
#[derive(Clone)]
pub struct Recorder {
    shared: Arc<Shared>,
}

impl Recorder {
    /// Create a recorder reading from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `config` fails validation.
    #[track_caller]
    #[instrument(skip(input))]
    pub fn new(input: Arc<dyn InputDevice>, config: RecorderConfig) -> CoreResult<Self> {
        config.validate()?;

        let machine = RecordingStateMachine::new(config.countdown_seconds);
        let sampler = SignalSampler::new(config.fft_size, config.frequency_scale);
        let (frames, _) = watch::channel(WaveformFrame::baseline(config.baseline_level, config.mode));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            fft_size = config.fft_size,
            frame_rate = config.frame_rate,
            countdown_seconds = config.countdown_seconds,
            "Recorder initialized"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(RecorderInner {
                    machine,
                    session: None,
                    sampler,
                    artifact: None,
                    mode: config.mode,
                    generation: 0,
                    countdown: None,
                    animation: None,
                }),
                input,
                config,
                urls: ObjectUrls::new(),
                frames,
                events,
            }),
        })
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RecordingState {
        self.lock().machine.state()
    }

    /// Observe lifecycle state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<RecordingState> {
        self.lock().machine.subscribe()
    }

    /// Observe published waveform frames.
    pub fn frames(&self) -> watch::Receiver<WaveformFrame> {
        self.shared.frames.subscribe()
    }

    /// Observe lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<RecorderEvent> {
        self.shared.events.subscribe()
    }

    /// Registry backing artifact URLs.
    pub fn object_urls(&self) -> &ObjectUrls {
        &self.shared.urls
    }

    /// Configuration the recorder was built with.
    pub fn config(&self) -> &RecorderConfig {
        &self.shared.config
    }

    /// Current recording attempt number.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Current renderer mode.
    pub fn mode(&self) -> WaveformMode {
        self.lock().mode
    }

    /// The finalized recording, if any.
    pub fn artifact(&self) -> Option<RecordingArtifact> {
        self.lock().artifact.clone()
    }

    /// Snapshot of the open session, if any.
    pub fn session_stats(&self) -> Option<SessionStats> {
        let inner = self.lock();
        inner.session.as_ref().map(|s| SessionStats {
            id: s.id(),
            generation: s.generation(),
            chunk_count: s.chunk_count(),
            samples_seen: s.analyser().samples_seen(),
            sample_rate: s.sample_rate(),
        })
    }

    /// Whether the animation task for the current attempt is alive.
    pub fn is_animating(&self) -> bool {
        let inner = self.lock();
        inner
            .animation
            .as_ref()
            .is_some_and(|a| a.is_running() && a.generation() == inner.generation)
    }

    /// Begin the countdown.
    ///
    /// Ignored while counting down, recording or paused. From `Stopped` the
    /// previous recording is released first, so a new attempt always starts
    /// from `Idle` with no artifact.
    #[instrument(skip(self))]
    pub fn start(&self) -> Transition {
        let mut inner = self.lock();

        if inner.machine.state() == RecordingState::Stopped {
            self.teardown(&mut inner);
            inner.machine.reset();
        }

        let transition = inner.machine.start();
        if transition == Transition::Ignored {
            return transition;
        }

        inner.generation += 1;
        let generation = inner.generation;
        self.emit(RecorderEvent::StateChanged(inner.machine.state()));

        inner.countdown = Countdown::spawn(Arc::downgrade(&self.shared), generation, COUNTDOWN_PERIOD);

        info!(generation, "Countdown started");

        transition
    }

    /// Advance the countdown by one second.
    ///
    /// Called by the countdown task; hosts without a runtime call it
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DeviceAccess`] if the countdown ends and the
    /// microphone cannot be opened. The recorder is back in `Idle` and a
    /// [`RecorderEvent::Notice`] has been emitted.
    pub fn tick(&self) -> CoreResult<Transition> {
        let generation = self.lock().generation;
        self.countdown_tick(generation)
    }

    #[instrument(skip(self))]
    pub(crate) fn countdown_tick(&self, generation: u64) -> CoreResult<Transition> {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(current = inner.generation, "Stale countdown tick ignored");
            return Ok(Transition::Ignored);
        }

        let transition = inner.machine.tick();
        match transition {
            Transition::Countdown(_) => {
                self.emit(RecorderEvent::StateChanged(inner.machine.state()));
            }
            Transition::BeganRecording => {
                // The countdown task is the caller here; it exits on its own.
                inner.countdown = None;

                let gate = inner.machine.subscribe();
                match CaptureSession::open(
                    self.shared.input.as_ref(),
                    &self.shared.config,
                    gate,
                    generation,
                ) {
                    Ok(session) => {
                        inner.session = Some(session);
                        self.emit(RecorderEvent::StateChanged(RecordingState::Recording));
                        self.start_animation(&mut inner);
                    }
                    Err(e) => {
                        inner.machine.reset();
                        error!(generation, error = %e, "Failed to open capture session");
                        self.emit(RecorderEvent::StateChanged(inner.machine.state()));
                        self.emit(RecorderEvent::Notice(format!(
                            "Could not access the microphone: {}",
                            e
                        )));
                        return Err(e);
                    }
                }
            }
            _ => {}
        }

        Ok(transition)
    }

    /// Recording -> Paused. The stream keeps flowing; the encoder and the
    /// waveform freeze.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] without an open session or when
    /// not recording.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn pause(&self) -> CoreResult<Transition> {
        let mut inner = self.lock();
        let RecorderInner {
            machine, session, ..
        } = &mut *inner;

        let state = machine.state();
        let Some(session) = session.as_mut() else {
            return Err(invalid("pause", state));
        };
        if state != RecordingState::Recording {
            return Err(invalid("pause", state));
        }

        // Cut the pending chunk while still Recording so nothing is emitted
        // once Paused.
        session.pause()?;
        let transition = machine.pause()?;
        self.emit(RecorderEvent::StateChanged(machine.state()));

        Ok(transition)
    }

    /// Paused -> Recording.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] without an open session or when
    /// not paused.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn resume(&self) -> CoreResult<Transition> {
        let mut inner = self.lock();
        let RecorderInner {
            machine, session, ..
        } = &mut *inner;

        let state = machine.state();
        let Some(session) = session.as_mut() else {
            return Err(invalid("resume", state));
        };
        if state != RecordingState::Paused {
            return Err(invalid("resume", state));
        }

        session.resume()?;
        let transition = machine.resume()?;
        self.emit(RecorderEvent::StateChanged(machine.state()));

        Ok(transition)
    }

    /// Pause when recording, resume when paused.
    #[track_caller]
    pub fn toggle_pause(&self) -> CoreResult<Transition> {
        match self.state() {
            RecordingState::Paused => self.resume(),
            _ => self.pause(),
        }
    }

    /// Recording or Paused -> Stopped: finalize the session into an
    /// artifact, then dispose it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidState`] without an open session, or
    /// [`CoreError::Encoding`] if packaging fails (the session is disposed
    /// either way).
    #[track_caller]
    #[instrument(skip(self))]
    pub fn stop(&self) -> CoreResult<Transition> {
        let mut inner = self.lock();

        let state = inner.machine.state();
        let Some(mut session) = inner.session.take() else {
            return Err(invalid("stop", state));
        };

        // Leaving Recording closes both the encoder gate and the frame gate
        // before the session is touched.
        let transition = match inner.machine.stop() {
            Ok(t) => t,
            Err(e) => {
                inner.session = Some(session);
                return Err(e);
            }
        };
        self.emit(RecorderEvent::StateChanged(inner.machine.state()));

        let packaged = session.finalize(&self.shared.urls);
        session.dispose();
        if let Some(animation) = inner.animation.take() {
            animation.stop();
        }

        match packaged {
            Ok(artifact) => {
                info!(
                    url = %artifact.download_url(),
                    chunk_count = artifact.chunk_count(),
                    "Recording stopped"
                );
                self.emit(RecorderEvent::ArtifactReady {
                    url: artifact.download_url().to_string(),
                    bytes: artifact.data().len(),
                });
                inner.artifact = Some(artifact);
                Ok(transition)
            }
            Err(e) => {
                error!(error = %e, "Failed to package recording");
                self.emit(RecorderEvent::Notice(format!("Recording could not be saved: {}", e)));
                Err(e)
            }
        }
    }

    /// The two-step "Done" control: pauses a running recording, stops a
    /// paused one.
    #[track_caller]
    pub fn done(&self) -> CoreResult<Transition> {
        match self.state() {
            RecordingState::Recording => self.pause(),
            RecordingState::Paused => self.stop(),
            other => Err(invalid("finish", other)),
        }
    }

    /// Return to Idle from any state: cancel the countdown, dispose the
    /// session without finalizing, release the artifact.
    #[instrument(skip(self))]
    pub fn reset(&self) -> Transition {
        let mut inner = self.lock();
        self.teardown(&mut inner);

        let transition = inner.machine.reset();
        inner.generation += 1;
        if transition != Transition::Ignored {
            self.emit(RecorderEvent::StateChanged(inner.machine.state()));
        }
        self.shared
            .frames
            .send_replace(WaveformFrame::baseline(self.shared.config.baseline_level, inner.mode));

        transition
    }

    /// Alias of [`Recorder::reset`] for the Delete control.
    pub fn delete(&self) -> Transition {
        self.reset()
    }

    /// Release the artifact URL without leaving `Stopped`.
    ///
    /// Returns `false` if there was nothing to release.
    pub fn discard_artifact(&self) -> bool {
        let mut inner = self.lock();
        self.release_artifact(&mut inner)
    }

    /// Save the artifact as `dir/audio.wav`.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidState`] if there is no artifact, or
    /// [`CoreError::Io`] if writing fails.
    #[track_caller]
    pub fn download(&self, dir: &Path) -> CoreResult<PathBuf> {
        let (artifact, state) = {
            let inner = self.lock();
            (inner.artifact.clone(), inner.machine.state())
        };
        match artifact {
            Some(artifact) => artifact.download(dir),
            None => Err(invalid("download", state)),
        }
    }

    /// Select which scalar published frames carry for the renderer.
    pub fn set_mode(&self, mode: WaveformMode) {
        let mut inner = self.lock();
        inner.mode = mode;
        self.shared.frames.send_modify(|frame| frame.mode = mode);
        debug!(mode = %mode, "Waveform mode set");
    }

    /// Switch between amplitude and frequency rendering.
    pub fn toggle_mode(&self) -> WaveformMode {
        let mode = self.mode().toggled();
        self.set_mode(mode);
        mode
    }

    /// Sample and publish one frame if sampling is permitted.
    ///
    /// Returns the published frame, or `None` when gated.
    ///
    /// # Errors
    ///
    /// Only [`CoreError::StaleHandle`], which the single lock makes
    /// unreachable.
    pub fn frame_tick(&self) -> CoreResult<Option<WaveformFrame>> {
        match self.sample_frame(None)? {
            FrameOutcome::Published(frame) => Ok(Some(frame)),
            _ => Ok(None),
        }
    }

    pub(crate) fn frame_tick_for(&self, generation: u64) -> CoreResult<FrameOutcome> {
        self.sample_frame(Some(generation))
    }

    /// Cancel every task and dispose everything.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        self.reset();
        info!("Recorder shut down");
    }

    fn sample_frame(&self, generation: Option<u64>) -> CoreResult<FrameOutcome> {
        let mut inner = self.lock();
        if generation.is_some_and(|g| g != inner.generation) {
            return Ok(FrameOutcome::Ended);
        }
        if !inner.machine.state().is_sampling() {
            return Ok(FrameOutcome::Gated);
        }

        let RecorderInner {
            session,
            sampler,
            mode,
            ..
        } = &mut *inner;
        let Some(session) = session.as_mut() else {
            return Ok(FrameOutcome::Gated);
        };

        let energy = sampler.sample(session.analyser_mut()?)?;
        let frame = WaveformFrame::from_energy(energy, *mode);
        self.shared.frames.send_replace(frame);

        trace!(
            time_domain = frame.time_domain,
            frequency_domain = frame.frequency_domain,
            "Frame published"
        );

        Ok(FrameOutcome::Published(frame))
    }

    fn start_animation(&self, inner: &mut RecorderInner) {
        let generation = inner.generation;
        if inner
            .animation
            .as_ref()
            .is_some_and(|a| a.is_running() && a.generation() == generation)
        {
            debug!(generation, "Animation loop already running");
            return;
        }
        if let Some(stale) = inner.animation.take() {
            stale.stop();
        }
        inner.animation = AnimationLoop::spawn(
            Arc::downgrade(&self.shared),
            generation,
            self.shared.config.frame_interval(),
        );
    }

    fn teardown(&self, inner: &mut RecorderInner) {
        if let Some(countdown) = inner.countdown.take() {
            countdown.cancel();
        }
        if let Some(animation) = inner.animation.take() {
            animation.stop();
        }
        if let Some(mut session) = inner.session.take() {
            session.dispose();
        }
        self.release_artifact(inner);
    }

    fn release_artifact(&self, inner: &mut RecorderInner) -> bool {
        let Some(artifact) = inner.artifact.take() else {
            return false;
        };
        artifact.discard();
        info!(url = %artifact.download_url(), "Recording released");
        self.emit(RecorderEvent::ArtifactReleased {
            url: artifact.download_url().to_string(),
        });
        true
    }

    fn emit(&self, event: RecorderEvent) {
        // No subscribers is not an error.
        let _ = self.shared.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, RecorderInner> {
        self.shared.inner.lock().unwrap_or_else(|e| {
            warn!("Recorder lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

#[track_caller]
fn invalid(operation: &'static str, state: RecordingState) -> CoreError {
    CoreError::InvalidState {
        operation,
        state: state.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
