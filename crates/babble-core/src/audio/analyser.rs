//! Analysis node fed by the live input stream.
//!
//! Mirrors the byte-oriented analyser found in browser audio stacks: the
//! newest `fft_size` samples are kept in a ring, and reads expose them either
//! as unsigned bytes centered on 128 or as a smoothed, dB-scaled spectrum.

use crate::{CoreError, CoreResult, RecorderConfig};

use std::{
    collections::VecDeque,
    f32::consts::PI,
    panic::Location,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use realfft::{RealFftPlanner, RealToComplex, num_complex::Complex32};
use tracing::{debug, error, warn};

/// Smallest analysis window accepted.
pub const MIN_FFT_SIZE: usize = 32;
/// Largest analysis window accepted.
pub const MAX_FFT_SIZE: usize = 32_768;

/// Neutral byte value for a zero sample in time-domain reads.
pub const TIME_DOMAIN_MIDPOINT: u8 = 128;

/// Read side of an analysis node.
pub trait AnalysisNode: Send {
    /// Analysis window length in samples.
    fn fft_size(&self) -> usize;

    /// Number of meaningful frequency bins, half the window.
    fn frequency_bin_count(&self) -> usize {
        self.fft_size() / 2
    }

    /// Copy the current waveform into `out` as bytes centered on 128.
    ///
    /// Fills at most `fft_size` entries.
    fn byte_time_domain_data(&self, out: &mut [u8]) -> CoreResult<()>;

    /// Copy the current spectrum into `out` as bytes in `0..=255`.
    ///
    /// Fills at most `frequency_bin_count` entries and leaves the rest of
    /// `out` untouched.
    fn byte_frequency_data(&mut self, out: &mut [u8]) -> CoreResult<()>;
}

struct SampleRing {
    samples: VecDeque<f32>,
    window: usize,
    seen: u64,
}

/// Write side of an [`Analyser`], handed to the input callback.
#[derive(Clone)]
pub struct AnalyserInput {
    ring: Arc<Mutex<SampleRing>>,
    detached: Arc<AtomicBool>,
}

impl AnalyserInput {
    /// Append live samples, dropping the oldest beyond the window.
    pub fn push(&self, data: &[f32]) {
        if self.detached.load(Ordering::Acquire) {
            return;
        }
        let mut ring = lock_ring(&self.ring);
        ring.seen += data.len() as u64;
        let window = ring.window;
        let data = if data.len() > window {
            &data[data.len() - window..]
        } else {
            data
        };
        while ring.samples.len() + data.len() > window {
            ring.samples.pop_front();
        }
        ring.samples.extend(data.iter().copied());
    }
}

/// FFT-backed analysis node.
pub struct Analyser {
    fft_size: usize,
    ring: Arc<Mutex<SampleRing>>,
    detached: Arc<AtomicBool>,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex32>,
    scratch: Vec<Complex32>,
    smoothed: Vec<f32>,
    smoothing_time_constant: f32,
    min_decibels: f32,
    max_decibels: f32,
}

impl Analyser {
    /// Build an analyser and its input handle from recorder settings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if `fft_size` is not a power of
    /// two in `MIN_FFT_SIZE..=MAX_FFT_SIZE`, or the decibel range is empty.
    #[track_caller]
    pub fn new(config: &RecorderConfig) -> CoreResult<(Self, AnalyserInput)> {
        let fft_size = config.fft_size;
        validate_fft_size(fft_size)?;

        if !config.min_decibels.is_finite()
            || !config.max_decibels.is_finite()
            || config.min_decibels >= config.max_decibels
        {
            return Err(CoreError::InvalidConfig {
                reason: format!(
                    "min_decibels ({}) must be a finite value below max_decibels ({})",
                    config.min_decibels, config.max_decibels
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);

        let mut samples = VecDeque::with_capacity(fft_size);
        samples.extend(std::iter::repeat_n(0.0f32, fft_size));
        let ring = Arc::new(Mutex::new(SampleRing {
            samples,
            window: fft_size,
            seen: 0,
        }));
        let detached = Arc::new(AtomicBool::new(false));

        let analyser = Self {
            fft_size,
            ring: Arc::clone(&ring),
            detached: Arc::clone(&detached),
            window: blackman(fft_size),
            input: fft.make_input_vec(),
            spectrum: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),
            fft,
            smoothed: vec![0.0; fft_size / 2],
            smoothing_time_constant: config.smoothing_time_constant.clamp(0.0, 1.0),
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
        };

        debug!(fft_size = fft_size, "Analyser created");

        Ok((analyser, AnalyserInput { ring, detached }))
    }

    /// Total samples delivered by the stream since creation.
    pub fn samples_seen(&self) -> u64 {
        lock_ring(&self.ring).seen
    }

    /// Disconnect from the stream. Further reads fail with
    /// [`CoreError::StaleHandle`].
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    /// Whether [`Analyser::detach`] has been called.
    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    #[track_caller]
    fn ensure_attached(&self) -> CoreResult<()> {
        if self.is_detached() {
            return Err(CoreError::StaleHandle {
                resource: "analysis node",
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}

impl AnalysisNode for Analyser {
    fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[track_caller]
    fn byte_time_domain_data(&self, out: &mut [u8]) -> CoreResult<()> {
        self.ensure_attached()?;
        let ring = lock_ring(&self.ring);
        for (dst, &s) in out.iter_mut().zip(ring.samples.iter()) {
            *dst = (128.0 * (s + 1.0)).floor().clamp(0.0, 255.0) as u8;
        }
        Ok(())
    }

    #[track_caller]
    fn byte_frequency_data(&mut self, out: &mut [u8]) -> CoreResult<()> {
        self.ensure_attached()?;

        {
            let ring = lock_ring(&self.ring);
            for ((dst, &s), &w) in self
                .input
                .iter_mut()
                .zip(ring.samples.iter())
                .zip(self.window.iter())
            {
                *dst = s * w;
            }
        }

        if let Err(e) =
            self.fft
                .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
        {
            // Buffer lengths come from the planner, so this is unreachable in
            // practice. Report silence rather than failing the frame.
            warn!(error = %e, "FFT failed, reporting silence");
            self.spectrum.iter_mut().for_each(|c| *c = Complex32::new(0.0, 0.0));
        }

        let tau = self.smoothing_time_constant;
        let scale = 1.0 / self.fft_size as f32;
        let range = self.max_decibels - self.min_decibels;

        for (i, (prev, bin)) in self.smoothed.iter_mut().zip(self.spectrum.iter()).enumerate() {
            *prev = tau * *prev + (1.0 - tau) * bin.norm() * scale;
            if let Some(dst) = out.get_mut(i) {
                *dst = if *prev > 0.0 {
                    let db = 20.0 * prev.log10();
                    (255.0 * (db - self.min_decibels) / range)
                        .floor()
                        .clamp(0.0, 255.0) as u8
                } else {
                    0
                };
            }
        }

        Ok(())
    }
}

/// Reject windows the FFT node cannot use.
#[track_caller]
pub(crate) fn validate_fft_size(fft_size: usize) -> CoreResult<()> {
    if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
        return Err(CoreError::InvalidConfig {
            reason: format!(
                "fft_size must be a power of two between {} and {}, got {}",
                MIN_FFT_SIZE, MAX_FFT_SIZE, fft_size
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }
    Ok(())
}

fn blackman(n: usize) -> Vec<f32> {
    let (a0, a1, a2) = (0.42f32, 0.5f32, 0.08f32);
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

fn lock_ring(ring: &Mutex<SampleRing>) -> MutexGuard<'_, SampleRing> {
    ring.lock().unwrap_or_else(|e| {
        error!("Analyser ring lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}
