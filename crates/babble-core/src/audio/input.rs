use crate::{CoreError, CoreResult};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Receives mono `f32` samples from the audio thread.
pub type SampleCallback = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// A live input stream. Delivery ends on [`InputStream::stop`] or drop.
pub trait InputStream: Send {
    /// Sample rate of the delivered mono signal.
    fn sample_rate(&self) -> u32;

    /// Stop delivering samples. Safe to call more than once.
    fn stop(&mut self);
}

/// Permission-gated microphone boundary.
pub trait InputDevice: Send + Sync {
    /// Open a stream that forwards every captured buffer to `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DeviceAccess`] when permission is denied or no
    /// device is available.
    fn open(&self, callback: SampleCallback) -> CoreResult<Box<dyn InputStream>>;
}

/// Microphone input through CPAL.
///
/// The device is resolved when a stream is opened, not at construction, so a
/// missing microphone only surfaces once the user asks to record.
#[derive(Debug, Clone, Default)]
pub struct CpalInput {
    selected_device: Option<String>,
}

impl CpalInput {
    /// Use `selected_device` by name, or the host default when `None`.
    pub fn new(selected_device: Option<String>) -> Self {
        Self { selected_device }
    }

    #[track_caller]
    fn resolve_device(&self) -> CoreResult<Device> {
        let host = cpal::default_host();

        if let Some(wanted) = &self.selected_device {
            let mut devices = host.input_devices().map_err(|e| CoreError::DeviceAccess {
                reason: format!("Failed to enumerate input devices: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

            #[allow(deprecated)]
            let found = devices.find(|d| d.name().map(|n| &n == wanted).unwrap_or(false));

            return found.ok_or_else(|| CoreError::DeviceAccess {
                reason: format!("Input device '{}' not found", wanted),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        host.default_input_device()
            .ok_or_else(|| CoreError::DeviceAccess {
                reason: "No microphone found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl InputDevice for CpalInput {
    #[track_caller]
    #[instrument(skip(self, callback))]
    fn open(&self, mut callback: SampleCallback) -> CoreResult<Box<dyn InputStream>> {
        let device = self.resolve_device()?;

        let supported = device
            .default_input_config()
            .map_err(|e| CoreError::DeviceAccess {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let config: StreamConfig = supported.into();
        let channels = usize::from(config.channels.max(1));

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate,
            channels = channels,
            "Input device opened"
        );

        let shutdown = Arc::new(AtomicBool::new(false));
        let callback_shutdown = Arc::clone(&shutdown);
        let mut mono = Vec::new();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Once stop() sets this flag no buffer reaches the session,
                    // even if CPAL fires one more callback before the drop.
                    if callback_shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    if channels == 1 {
                        callback(data);
                        return;
                    }
                    mono.clear();
                    mono.extend(
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
                    );
                    callback(&mono);
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| CoreError::DeviceAccess {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| CoreError::DeviceAccess {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!("Audio capture started");

        Ok(Box::new(CpalStream {
            stream: Some(stream),
            sample_rate: config.sample_rate,
            shutdown,
        }))
    }
}

struct CpalStream {
    stream: Option<Stream>,
    sample_rate: u32,
    shutdown: Arc<AtomicBool>,
}

impl InputStream for CpalStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn stop(&mut self) {
        // Signal the callback before dropping the stream.
        self.shutdown.store(true, Ordering::Release);

        if let Some(stream) = self.stream.take() {
            drop(stream);
            info!("Audio capture stopped");
        }
    }
}

impl Drop for CpalStream {
    fn drop(&mut self) {
        self.stop();
    }
}
