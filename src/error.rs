//! Error types and handling.

use thiserror::Error;

use crate::config::ConfigError;
use crate::raster::FrameLengthError;
use crate::scope::AcquireError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Scope capture failed
    #[error("Capture error: {0}")]
    Acquire(#[from] AcquireError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Raw dump file has the wrong size
    #[error("Invalid screen dump: {0}")]
    InvalidDump(#[from] FrameLengthError),

    /// Blocking capture task panicked or was cancelled
    #[error("Capture task failed: {0}")]
    TaskFailed(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether the poll loop can carry on after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Acquire(AcquireError::ChannelOpen { .. }) => false,
            Self::Acquire(_) => true,
            Self::Io(_) | Self::Image(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_errors_are_recoverable() {
        let timeout = AppError::from(AcquireError::Timeout {
            received: 0,
            expected: 40960,
        });
        assert!(timeout.is_recoverable());

        let overflow = AppError::from(AcquireError::Overflow {
            received: 40961,
            expected: 40960,
        });
        assert!(overflow.is_recoverable());
    }

    #[test]
    fn test_open_failure_is_fatal() {
        let err = AppError::from(AcquireError::ChannelOpen {
            path: "/dev/ttyUSB9".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("/dev/ttyUSB9"));
    }
}
