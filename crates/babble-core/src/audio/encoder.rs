use crate::RecordingState;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, error, trace};

/// Bytes per encoded sample (mono 16-bit little-endian PCM).
pub const BYTES_PER_SAMPLE: usize = 2;

/// One encoded slice of a recording, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    bytes: Vec<u8>,
}

impl AudioChunk {
    /// Encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the chunk holds no bytes. Emitted chunks never are.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Default)]
struct EncoderState {
    pending: Vec<u8>,
    chunks: Vec<AudioChunk>,
    timeslice_bytes: usize,
    paused: bool,
    closed: bool,
}

/// PCM chunk encoder bound to one capture session.
///
/// Encodes only while the observed recording state is `Recording` and the
/// encoder itself is not paused. The gate is read outside the lock; the
/// paused flag is checked under it.
#[derive(Clone)]
pub struct ChunkEncoder {
    state: Arc<Mutex<EncoderState>>,
    gate: watch::Receiver<RecordingState>,
}

impl ChunkEncoder {
    /// Create an encoder gated on `gate`.
    pub fn new(gate: watch::Receiver<RecordingState>) -> Self {
        Self {
            state: Arc::new(Mutex::new(EncoderState::default())),
            gate,
        }
    }

    /// Cut a chunk every `timeslice_ms` of audio at `sample_rate`.
    ///
    /// Zero disables periodic cuts; chunks are then only cut by
    /// [`ChunkEncoder::flush`].
    pub fn set_timeslice(&self, sample_rate: u32, timeslice_ms: u64) {
        let samples = u64::from(sample_rate) * timeslice_ms / 1000;
        let bytes = usize::try_from(samples)
            .unwrap_or(usize::MAX / BYTES_PER_SAMPLE)
            .saturating_mul(BYTES_PER_SAMPLE);
        self.lock().timeslice_bytes = bytes;
        debug!(sample_rate, timeslice_ms, timeslice_bytes = bytes, "Encoder timeslice set");
    }

    /// Encode a buffer of mono samples. Called from the audio thread.
    pub fn encode(&self, data: &[f32]) {
        if *self.gate.borrow() != RecordingState::Recording {
            return;
        }

        let mut state = self.lock();
        if state.closed || state.paused {
            return;
        }

        state.pending.reserve(data.len() * BYTES_PER_SAMPLE);
        for &s in data {
            let pcm = (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
            state.pending.extend_from_slice(&pcm.to_le_bytes());
        }

        let slice = state.timeslice_bytes;
        if slice == 0 {
            return;
        }
        while state.pending.len() >= slice {
            let rest = state.pending.split_off(slice);
            let bytes = std::mem::replace(&mut state.pending, rest);
            Self::on_chunk(&mut state, bytes);
        }
    }

    /// Emit whatever has been encoded since the last chunk.
    ///
    /// Returns `true` if a chunk was emitted.
    pub fn flush(&self) -> bool {
        let mut state = self.lock();
        if state.closed || state.pending.is_empty() {
            return false;
        }
        let bytes = std::mem::take(&mut state.pending);
        Self::on_chunk(&mut state, bytes);
        true
    }

    /// Stop accepting audio and cut the pending chunk, in one critical
    /// section.
    ///
    /// Returns `true` if a chunk was emitted.
    pub fn pause(&self) -> bool {
        let mut state = self.lock();
        state.paused = true;
        if state.closed || state.pending.is_empty() {
            return false;
        }
        let bytes = std::mem::take(&mut state.pending);
        Self::on_chunk(&mut state, bytes);
        true
    }

    /// Accept audio again once the gate reads `Recording`.
    pub fn resume(&self) {
        self.lock().paused = false;
    }

    /// Whether [`ChunkEncoder::pause`] is in effect.
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Number of chunks emitted so far.
    pub fn chunk_count(&self) -> usize {
        self.lock().chunks.len()
    }

    /// Flush, close for writes and hand over every chunk in emission order.
    ///
    /// Later calls return an empty list.
    pub fn close(&self) -> Vec<AudioChunk> {
        let mut state = self.lock();
        if state.closed {
            return Vec::new();
        }
        if !state.pending.is_empty() {
            let bytes = std::mem::take(&mut state.pending);
            Self::on_chunk(&mut state, bytes);
        }
        state.closed = true;
        std::mem::take(&mut state.chunks)
    }

    /// Whether [`ChunkEncoder::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn on_chunk(state: &mut EncoderState, bytes: Vec<u8>) {
        trace!(bytes = bytes.len(), index = state.chunks.len(), "Chunk emitted");
        state.chunks.push(AudioChunk { bytes });
    }

    fn lock(&self) -> MutexGuard<'_, EncoderState> {
        self.state.lock().unwrap_or_else(|e| {
            error!("Encoder lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}
