//! Error types for capture, publishing, device assembly and commands.

use thiserror::Error;

/// Failure of a single capture-and-upload attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No frame, or a zero-length frame.
    #[error("camera produced no usable frame")]
    SensorUnavailable,
    /// The transport reported a non-positive status code.
    #[error("upload failed (code {code})")]
    TransportFailure { code: i32 },
}

/// A weight write the realtime database rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("publish failed: {message} (code {code})")]
pub struct PublishError {
    pub code: i32,
    pub message: String,
}

/// Everything a command can fail with once the device is assembled.
#[derive(Debug, Error, Clone)]
pub enum ScaleError {
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
    #[error("transport failure (code {code}): {message}")]
    TransportFailure { code: i32, message: String },
    #[error("auth session not ready after {waited_ms} ms")]
    AuthTimeout { waited_ms: u64 },
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<CaptureError> for ScaleError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::SensorUnavailable => Self::SensorUnavailable(e.to_string()),
            CaptureError::TransportFailure { code } => Self::TransportFailure {
                code,
                message: "image upload".into(),
            },
        }
    }
}

impl From<PublishError> for ScaleError {
    fn from(e: PublishError) -> Self {
        Self::TransportFailure {
            code: e.code,
            message: e.message,
        }
    }
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
