use crate::{
    CoreError, MIME_TYPE, Recorder, RecorderConfig, RecorderEvent, RecordingState, Transition,
    WaveformMode,
    tests::support::ScriptedInput,
};

use std::sync::Arc;

use tokio::sync::broadcast;

fn config() -> RecorderConfig {
    RecorderConfig {
        countdown_seconds: 3,
        timeslice_ms: 250,
        ..RecorderConfig::default()
    }
}

#[allow(clippy::unwrap_used)]
fn recorder(input: &ScriptedInput) -> Recorder {
    Recorder::new(Arc::new(input.clone()), config()).unwrap()
}

/// Start and tick until capture begins.
#[allow(clippy::unwrap_used)]
fn recording(input: &ScriptedInput) -> Recorder {
    let recorder = recorder(input);
    recorder.start();
    while recorder.tick().unwrap() != Transition::BeganRecording {}
    recorder
}

fn drain(events: &mut broadcast::Receiver<RecorderEvent>) -> Vec<RecorderEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

/// WHAT: Countdown, two seconds of tone, stop, one downloadable artifact
/// WHY: The basic recording flow is the product
#[test]
#[allow(clippy::unwrap_used)]
fn given_started_recorder_when_recording_two_seconds_then_artifact_ready() {
    // Given: A recorder with a three second countdown
    let input = ScriptedInput::new();
    let recorder = recorder(&input);
    let mut events = recorder.events();

    // When: Counting down, recording 2 s at 60 frames per second, stopping
    assert_eq!(recorder.start(), Transition::Countdown(3));
    assert_eq!(recorder.tick().unwrap(), Transition::Countdown(2));
    assert_eq!(recorder.tick().unwrap(), Transition::Countdown(1));
    assert_eq!(input.opened(), 0);
    assert_eq!(recorder.tick().unwrap(), Transition::BeganRecording);
    assert_eq!(recorder.state(), RecordingState::Recording);

    let frames: Vec<_> = (0..120)
        .filter_map(|_| {
            input.push_tone(440.0, 0.5, 133);
            recorder.frame_tick().unwrap()
        })
        .collect();
    let transition = recorder.stop().unwrap();

    // Then: Every frame published, one artifact labelled audio/wav
    assert_eq!(frames.len(), 120);
    assert!(frames.last().unwrap().frequency_domain > 0.0);
    assert_eq!(transition, Transition::Stopped);
    assert_eq!(recorder.state(), RecordingState::Stopped);
    assert!(recorder.session_stats().is_none());
    assert!(!input.is_streaming());

    let artifact = recorder.artifact().unwrap();
    assert_eq!(artifact.mime_type(), MIME_TYPE);
    assert!(artifact.chunk_count() > 0);
    assert_eq!(artifact.payload().len(), 120 * 133 * 2);
    assert!(recorder.object_urls().resolve(artifact.download_url()).is_some());

    let seen = drain(&mut events);
    assert!(seen.contains(&RecorderEvent::StateChanged(RecordingState::Recording)));
    assert!(seen.contains(&RecorderEvent::ArtifactReady {
        url: artifact.download_url().to_string(),
        bytes: artifact.data().len(),
    }));
    assert_eq!(recorder.frame_tick().unwrap(), None);
}

/// WHAT: While paused, no frames are published and no chunks are emitted
/// WHY: Pause freezes the waveform and the recording, not the stream
#[test]
#[allow(clippy::unwrap_used)]
fn given_paused_recorder_when_frames_tick_then_nothing_published() {
    // Given: A recording that captured 2000 samples, then paused
    let input = ScriptedInput::new();
    let recorder = recording(&input);
    input.push_tone(440.0, 0.5, 2000);
    recorder.frame_tick().unwrap();
    assert_eq!(recorder.pause().unwrap(), Transition::Paused);

    let mut frames = recorder.frames();
    frames.borrow_and_update();
    let before = recorder.session_stats().unwrap();

    // When: Five frames elapse with audio still arriving
    let ticks: Vec<_> = (0..5)
        .map(|_| {
            input.push_tone(440.0, 0.5, 800);
            recorder.frame_tick().unwrap()
        })
        .collect();

    // Then: Nothing published, stream advanced, chunk count frozen
    assert!(ticks.iter().all(Option::is_none));
    assert!(!frames.has_changed().unwrap());
    let after = recorder.session_stats().unwrap();
    assert_eq!(after.samples_seen, before.samples_seen + 4000);
    assert_eq!(after.chunk_count, before.chunk_count);
    assert_eq!(before.chunk_count, 1);

    // And: Resuming publishes again
    assert_eq!(recorder.resume().unwrap(), Transition::Resumed);
    input.push_tone(440.0, 0.5, 800);
    assert!(recorder.frame_tick().unwrap().is_some());
    assert!(frames.has_changed().unwrap());
}

/// WHAT: A refused microphone returns the recorder to Idle with a notice
/// WHY: The user must be told and allowed to try again
#[test]
#[allow(clippy::unwrap_used)]
fn given_denied_device_when_countdown_ends_then_idle_with_notice() {
    // Given: A recorder over a device that refuses access
    let input = ScriptedInput::denied();
    let recorder = recorder(&input);
    let mut events = recorder.events();
    recorder.start();
    recorder.tick().unwrap();
    recorder.tick().unwrap();

    // When: The countdown ends
    let result = recorder.tick();

    // Then: DeviceAccess, Idle, a notice, and start() works again
    assert!(matches!(result, Err(CoreError::DeviceAccess { .. })));
    assert_eq!(recorder.state(), RecordingState::Idle);
    assert!(recorder.session_stats().is_none());
    let seen = drain(&mut events);
    assert!(seen.iter().any(|e| matches!(
        e,
        RecorderEvent::Notice(text) if text.starts_with("Could not access the microphone")
    )));
    assert_eq!(recorder.start(), Transition::Countdown(3));
}

/// WHAT: pause() and stop() without an open session are rejected
/// WHY: Controls arriving in the wrong state must not corrupt the lifecycle
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_session_when_pausing_or_stopping_then_invalid_state() {
    // Given: An idle recorder
    let input = ScriptedInput::new();
    let recorder = recorder(&input);

    // When: Pausing while idle, stopping during the countdown
    let paused = recorder.pause();
    recorder.start();
    let stopped = recorder.stop();

    // Then: Both rejected and the countdown carries on
    assert!(matches!(paused, Err(CoreError::InvalidState { operation: "pause", .. })));
    assert!(matches!(stopped, Err(CoreError::InvalidState { operation: "stop", .. })));
    assert_eq!(recorder.state(), RecordingState::CountingDown(3));
    assert_eq!(recorder.tick().unwrap(), Transition::Countdown(2));
}

/// WHAT: Done pauses a running recording, then stops the paused one
/// WHY: The primary control is a two-step finish
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_pressing_done_twice_then_paused_then_stopped() {
    // Given: A recording
    let input = ScriptedInput::new();
    let recorder = recording(&input);
    input.push_silence(500);

    // When: Pressing Done twice, then a third time
    let first = recorder.done().unwrap();
    let second = recorder.done().unwrap();
    let third = recorder.done();

    // Then: Paused, Stopped, then rejected
    assert_eq!(first, Transition::Paused);
    assert_eq!(second, Transition::Stopped);
    assert!(matches!(third, Err(CoreError::InvalidState { operation: "finish", .. })));
    assert!(recorder.artifact().is_some());
}

/// WHAT: Reset releases everything and the next attempt starts clean
/// WHY: No state may leak between recording attempts
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_recorder_when_reset_and_restarted_then_fresh_session() {
    // Given: A finished recording
    let input = ScriptedInput::new();
    let recorder = recording(&input);
    input.push_tone(220.0, 0.4, 4000);
    recorder.frame_tick().unwrap();
    let first_generation = recorder.session_stats().unwrap().generation;
    recorder.stop().unwrap();
    let old_url = recorder.artifact().unwrap().download_url().to_string();

    // When: Resetting and recording again
    let transition = recorder.reset();
    let frame = *recorder.frames().borrow();
    recorder.start();
    while recorder.tick().unwrap() != Transition::BeganRecording {}

    // Then: Old URL revoked, baseline frame, new empty session
    assert_eq!(transition, Transition::Reset(RecordingState::Stopped));
    assert!(recorder.object_urls().resolve(&old_url).is_none());
    assert!(recorder.artifact().is_none());
    assert_eq!(frame.level(), config().baseline_level);

    let stats = recorder.session_stats().unwrap();
    assert_eq!(stats.chunk_count, 0);
    assert_eq!(stats.samples_seen, 0);
    assert_eq!(stats.generation, recorder.generation());
    assert_ne!(stats.generation, first_generation);
    assert_eq!(input.opened(), 2);
}

/// WHAT: start() from Stopped releases the previous artifact first
/// WHY: A new attempt must never leave the old download URL registered
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_recorder_when_starting_then_previous_artifact_released() {
    // Given: A finished recording
    let input = ScriptedInput::new();
    let recorder = recording(&input);
    input.push_silence(1000);
    recorder.stop().unwrap();
    let old_url = recorder.artifact().unwrap().download_url().to_string();
    let mut events = recorder.events();

    // When: Starting again
    let transition = recorder.start();

    // Then: Countdown begins, old artifact released
    assert_eq!(transition, Transition::Countdown(3));
    assert!(recorder.artifact().is_none());
    assert!(recorder.object_urls().is_empty());
    assert!(drain(&mut events).contains(&RecorderEvent::ArtifactReleased { url: old_url }));
}

/// WHAT: Reset during the countdown never opens the microphone
/// WHY: Cancelling must stop the countdown before capture begins
#[test]
#[allow(clippy::unwrap_used)]
fn given_countdown_when_reset_then_later_ticks_ignored() {
    // Given: A countdown in progress
    let input = ScriptedInput::new();
    let recorder = recorder(&input);
    recorder.start();
    recorder.tick().unwrap();

    // When: Resetting, then ticking past where recording would begin
    let transition = recorder.reset();
    let late: Vec<_> = (0..3).map(|_| recorder.tick().unwrap()).collect();

    // Then: Back to Idle, no session ever opened
    assert_eq!(transition, Transition::Reset(RecordingState::CountingDown(2)));
    assert!(late.iter().all(|t| *t == Transition::Ignored));
    assert_eq!(recorder.state(), RecordingState::Idle);
    assert_eq!(input.opened(), 0);
}

/// WHAT: download() writes audio.wav once stopped and fails before
/// WHY: Downloading only makes sense for a finished recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_recorder_when_downloading_then_requires_artifact() {
    // Given: A recording in progress and a target directory
    let input = ScriptedInput::new();
    let recorder = recording(&input);
    input.push_tone(330.0, 0.3, 3000);
    let dir = tempfile::tempdir().unwrap();

    // When: Downloading before and after stop
    let early = recorder.download(dir.path());
    recorder.stop().unwrap();
    let path = recorder.download(dir.path()).unwrap();

    // Then: Rejected first, then the artifact bytes on disk
    assert!(matches!(early, Err(CoreError::InvalidState { operation: "download", .. })));
    assert_eq!(path.file_name().unwrap(), "audio.wav");
    assert_eq!(std::fs::read(path).unwrap(), recorder.artifact().unwrap().data());
}

/// WHAT: The mode selects which scalar a frame renders
/// WHY: The renderer switches between amplitude and frequency views
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_switching_mode_then_frames_follow() {
    // Given: A recording fed with a tone
    let input = ScriptedInput::new();
    let recorder = recording(&input);
    input.push_tone(1000.0, 0.8, 4096);

    // When: Switching to frequency and sampling
    recorder.set_mode(WaveformMode::Frequency);
    let frame = recorder.frame_tick().unwrap().unwrap();

    // Then: The frame level is the frequency value, toggling goes back
    assert_eq!(frame.mode, WaveformMode::Frequency);
    assert_eq!(frame.level(), frame.frequency_domain);
    assert_eq!(recorder.frames().borrow().mode, WaveformMode::Frequency);
    assert_eq!(recorder.toggle_mode(), WaveformMode::Amplitude);
    assert_eq!(recorder.frames().borrow().level(), frame.time_domain);
}

/// WHAT: Invalid tunables are rejected at construction
/// WHY: A bad analysis window must fail early, not in the audio thread
#[test]
fn given_invalid_config_when_building_recorder_then_invalid_config() {
    // Given: A non power of two window and a zero frame rate
    let bad_fft = RecorderConfig {
        fft_size: 1000,
        ..RecorderConfig::default()
    };
    let bad_rate = RecorderConfig {
        frame_rate: 0,
        ..RecorderConfig::default()
    };

    // When: Building recorders
    let input: Arc<ScriptedInput> = Arc::new(ScriptedInput::new());
    let first = Recorder::new(input.clone(), bad_fft);
    let second = Recorder::new(input, bad_rate);

    // Then: Both rejected
    assert!(matches!(first, Err(CoreError::InvalidConfig { .. })));
    assert!(matches!(second, Err(CoreError::InvalidConfig { .. })));
}

/// WHAT: discard_artifact() releases the URL but keeps the Stopped state
/// WHY: The download link can be dropped without starting over
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_recorder_when_discarding_artifact_then_url_released_once() {
    // Given: A finished recording
    let input = ScriptedInput::new();
    let recorder = recording(&input);
    input.push_silence(800);
    recorder.stop().unwrap();

    // When: Discarding twice
    let first = recorder.discard_artifact();
    let second = recorder.discard_artifact();

    // Then: Released once, still Stopped
    assert!(first);
    assert!(!second);
    assert!(recorder.artifact().is_none());
    assert!(recorder.object_urls().is_empty());
    assert_eq!(recorder.state(), RecordingState::Stopped);
}
