mod analyser;
mod encoder;
mod input;
mod sampler;
mod session;

pub use {
    analyser::{
        AnalysisNode, Analyser, AnalyserInput, MAX_FFT_SIZE, MIN_FFT_SIZE, TIME_DOMAIN_MIDPOINT,
    },
    encoder::{AudioChunk, BYTES_PER_SAMPLE, ChunkEncoder},
    input::{CpalInput, InputDevice, InputStream, SampleCallback},
    sampler::{DEFAULT_FREQUENCY_SCALE, EnergySample, SignalSampler},
    session::CaptureSession,
};

pub(crate) use analyser::validate_fft_size;
