use error_location::ErrorLocation;
use thiserror::Error;

/// Capture pipeline errors with source location tracking.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Microphone permission denied, or no usable input device.
    #[error("Device access error: {reason} {location}")]
    DeviceAccess {
        /// Description of the device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Operation is not legal in the current recording state.
    #[error("Invalid state: cannot {operation} while {state} {location}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// Human-readable state the operation was attempted in.
        state: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A disposed analysis node or encoder was touched.
    #[error("Stale handle: {resource} used after dispose {location}")]
    StaleHandle {
        /// Which resource was read after disposal.
        resource: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Packaging captured chunks into the output container failed.
    #[error("Encoding error: {reason} {location}")]
    Encoding {
        /// Description of the encoding failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Recorder configuration rejected during validation.
    #[error("Invalid configuration: {reason} {location}")]
    InvalidConfig {
        /// What was wrong with the configuration.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Filesystem error while saving an artifact.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl From<std::io::Error> for CoreError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        CoreError::Io {
            source,
            location: ErrorLocation::from(std::panic::Location::caller()),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
