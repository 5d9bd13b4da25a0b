use crate::{CoreResult, audio::AnalysisNode};

/// Default multiplier bringing spectral energy into the same visual range as
/// the time-domain mean.
pub const DEFAULT_FREQUENCY_SCALE: f32 = 10.0;

/// The two scalars derived from one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergySample {
    /// Mean of the byte time-domain buffer; 128 for silence.
    pub time_domain: f32,
    /// Mean of the byte frequency buffer times the scale factor; 0 for silence.
    pub frequency_domain: f32,
}

/// Reduces analysis buffers to one [`EnergySample`] per frame.
///
/// Owns both read buffers and reuses them across frames.
#[derive(Debug)]
pub struct SignalSampler {
    time_domain: Vec<u8>,
    frequency: Vec<u8>,
    scale_factor: f32,
}

impl SignalSampler {
    /// Create a sampler with buffers of `window` entries.
    pub fn new(window: usize, scale_factor: f32) -> Self {
        Self {
            time_domain: vec![0; window],
            frequency: vec![0; window],
            scale_factor,
        }
    }

    /// Length of both read buffers.
    pub fn window(&self) -> usize {
        self.time_domain.len()
    }

    /// Read `node` and reduce the buffers to their scaled means.
    ///
    /// # Errors
    ///
    /// Only fails if `node` has been detached.
    pub fn sample(&mut self, node: &mut dyn AnalysisNode) -> CoreResult<EnergySample> {
        node.byte_time_domain_data(&mut self.time_domain)?;
        node.byte_frequency_data(&mut self.frequency)?;

        Ok(EnergySample {
            time_domain: mean(&self.time_domain),
            frequency_domain: mean(&self.frequency) * self.scale_factor,
        })
    }
}

fn mean(buf: &[u8]) -> f32 {
    if buf.is_empty() {
        return 0.0;
    }
    let sum: u64 = buf.iter().map(|&b| u64::from(b)).sum();
    sum as f32 / buf.len() as f32
}
